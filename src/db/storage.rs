//! The shared page storage both consoles read and write.
//!
//! Values are opaque strings keyed by name, like browser page storage. Callers that
//! need read-modify-write go through [`PageStorage::update_item`], which backends must
//! execute atomically with respect to every other call on the same storage.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::Result;
use async_trait::async_trait;

pub mod keys {
    pub const DOCTOR_REQUEST_QUEUE: &str = "doctor_request_queue";
    pub const CRITICAL_SOS_ALERT: &str = "critical_sos_alert";
    /// Single-slot doctor request left behind by older dashboards; removed on sight.
    pub const LEGACY_DOCTOR_REQUEST_ALERT: &str = "critical_doctor_request_alert";
    pub const CURRENT_PATIENT_NAME: &str = "current_patient_name";
    pub const CURRENT_ADMIN_ID: &str = "current_admin_id";
    pub const HOSPITAL_PATIENTS: &str = "hospital_patients";
    pub const PATIENT_GOALS: &str = "patient_goals";

    pub fn staff_count(staff_type: &str) -> String {
        format!("staff_count_{staff_type}")
    }
}

/// What an atomic update does with the slot it just read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemWrite {
    Keep,
    Set(String),
    Remove,
}

#[async_trait]
pub trait PageStorage: Clone + Send + Sync + 'static {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    async fn set_item(&self, key: &str, value: String) -> Result<()>;

    /// Removing a missing key succeeds.
    async fn remove_item(&self, key: &str) -> Result<()>;

    /// Reads `key`, hands the raw value to `update` and applies the returned write,
    /// all without another writer slipping in between. An error from `update`
    /// aborts the write and is returned unchanged.
    async fn update_item<F, T>(&self, key: &str, update: F) -> Result<T>
    where
        F: FnOnce(Option<&str>) -> Result<(ItemWrite, T)> + Send + 'static,
        T: Send + 'static;
}

/// Process-local storage for tests and throwaway sessions.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        match self.items.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl PageStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        self.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    async fn update_item<F, T>(&self, key: &str, update: F) -> Result<T>
    where
        F: FnOnce(Option<&str>) -> Result<(ItemWrite, T)> + Send + 'static,
        T: Send + 'static,
    {
        let mut items = self.lock();
        let (write, output) = update(items.get(key).map(String::as_str))?;
        match write {
            ItemWrite::Keep => {}
            ItemWrite::Set(value) => {
                items.insert(key.to_string(), value);
            }
            ItemWrite::Remove => {
                items.remove(key);
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[tokio::test]
    async fn set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("a").await.unwrap(), None);

        storage.set_item("a", "1".into()).await.unwrap();
        assert_eq!(storage.get_item("a").await.unwrap().as_deref(), Some("1"));

        storage.remove_item("a").await.unwrap();
        storage.remove_item("a").await.unwrap();
        assert_eq!(storage.get_item("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_update_leaves_value_untouched() {
        let storage = MemoryStorage::new();
        storage.set_item("a", "before".into()).await.unwrap();

        let result: Result<()> = storage
            .update_item("a", |_| Err(anyhow!("rejected")))
            .await;
        assert!(result.is_err());
        assert_eq!(
            storage.get_item("a").await.unwrap().as_deref(),
            Some("before")
        );
    }

    #[tokio::test]
    async fn concurrent_updates_do_not_lose_writes() {
        let storage = MemoryStorage::new();
        let mut handles = Vec::new();
        for _ in 0..32 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage
                    .update_item("counter", |raw| {
                        let current: u32 = raw.map(|v| v.parse().unwrap()).unwrap_or(0);
                        Ok((ItemWrite::Set((current + 1).to_string()), ()))
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(
            storage.get_item("counter").await.unwrap().as_deref(),
            Some("32")
        );
    }

    #[test]
    fn staff_count_keys() {
        assert_eq!(keys::staff_count("nurses"), "staff_count_nurses");
    }
}
