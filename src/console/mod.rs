//! Patient-facing actions: identity, SOS, doctor-connect requests and goals.

mod goals;

use chrono::Utc;
use log::info;

use crate::{
    alerts::AlertStore,
    db::{keys, PageStorage},
    error::{CareError, CareResult},
    models::{DoctorRequest, SosAlert},
    queue::RequestQueue,
};

pub use goals::parse_goal_input;

#[derive(Clone)]
pub struct PatientConsole<S> {
    storage: S,
    queue: RequestQueue<S>,
    alerts: AlertStore<S>,
    default_name: String,
}

impl<S: PageStorage> PatientConsole<S> {
    pub fn new(storage: S, default_name: impl Into<String>) -> Self {
        Self {
            queue: RequestQueue::new(storage.clone()),
            alerts: AlertStore::new(storage.clone()),
            storage,
            default_name: default_name.into(),
        }
    }

    /// The signed-in patient's display name, or the default identity.
    pub async fn current_name(&self) -> CareResult<String> {
        let stored = self.storage.get_item(keys::CURRENT_PATIENT_NAME).await?;
        Ok(stored
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.default_name.clone()))
    }

    /// Seeds the identity slot on first use so the staff side sees a stable name.
    pub async fn ensure_default_name(&self) -> CareResult<()> {
        if self
            .storage
            .get_item(keys::CURRENT_PATIENT_NAME)
            .await?
            .is_none()
        {
            self.storage
                .set_item(keys::CURRENT_PATIENT_NAME, self.default_name.clone())
                .await?;
        }
        Ok(())
    }

    pub async fn set_current_name(&self, name: &str) -> CareResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CareError::validation("Patient name cannot be empty."));
        }
        self.storage
            .set_item(keys::CURRENT_PATIENT_NAME, name.to_string())
            .await?;
        info!("Patient console now signed in as {name}");
        Ok(())
    }

    pub async fn raise_sos(&self) -> CareResult<SosAlert> {
        let name = self.current_name().await?;
        self.alerts.raise_sos(&name, Utc::now()).await
    }

    pub async fn request_doctor(
        &self,
        reason: &str,
        criticality: &str,
    ) -> CareResult<DoctorRequest> {
        let name = self.current_name().await?;
        self.queue.submit(&name, reason, criticality).await
    }
}
