//! The critical SOS slot. At most one alert exists; the latest trigger wins.

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::{
    db::{
        helpers::{decode_optional, encode},
        keys, PageStorage,
    },
    error::CareResult,
    models::SosAlert,
};

#[derive(Clone)]
pub struct AlertStore<S> {
    storage: S,
}

impl<S: PageStorage> AlertStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Replaces whatever alert is active.
    pub async fn raise_sos(
        &self,
        patient_name: &str,
        triggered_at: DateTime<Utc>,
    ) -> CareResult<SosAlert> {
        let alert = SosAlert::new(patient_name, triggered_at);
        let value = encode(keys::CRITICAL_SOS_ALERT, &alert)?;
        self.storage
            .set_item(keys::CRITICAL_SOS_ALERT, value)
            .await?;
        warn!("SOS raised for patient {}", alert.patient_name);
        Ok(alert)
    }

    /// The active alert, if any. A non-empty slot that does not decode is still
    /// an alert, shown with whatever name can be recovered so staff can resolve it.
    pub async fn current_sos(&self) -> CareResult<Option<SosAlert>> {
        let raw = self.storage.get_item(keys::CRITICAL_SOS_ALERT).await?;
        let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
            return Ok(None);
        };
        Ok(Some(
            decode_optional(keys::CRITICAL_SOS_ALERT, Some(raw.as_str()))
                .unwrap_or_else(|| SosAlert::from_unreadable(&raw)),
        ))
    }

    pub async fn clear_sos(&self) -> CareResult<()> {
        self.storage.remove_item(keys::CRITICAL_SOS_ALERT).await?;
        info!("SOS alert resolved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;
    use crate::models::sos::UNKNOWN_PATIENT;
    use chrono::Duration;

    fn store() -> (MemoryStorage, AlertStore<MemoryStorage>) {
        let storage = MemoryStorage::new();
        (storage.clone(), AlertStore::new(storage))
    }

    #[tokio::test]
    async fn raise_then_read_returns_same_name_and_time() {
        let (_, alerts) = store();
        let at = Utc::now();
        alerts.raise_sos("Karan S.", at).await.unwrap();

        let current = alerts.current_sos().await.unwrap().unwrap();
        assert_eq!(current.patient_name, "Karan S.");
        assert_eq!(current.triggered_at, Some(at));
    }

    #[tokio::test]
    async fn second_sos_overwrites_first() {
        let (_, alerts) = store();
        let first = Utc::now();
        alerts.raise_sos("Karan S.", first).await.unwrap();
        alerts
            .raise_sos("Ria V.", first + Duration::seconds(5))
            .await
            .unwrap();

        let current = alerts.current_sos().await.unwrap().unwrap();
        assert_eq!(current.patient_name, "Ria V.");
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let (_, alerts) = store();
        alerts.raise_sos("Karan S.", Utc::now()).await.unwrap();

        alerts.clear_sos().await.unwrap();
        assert_eq!(alerts.current_sos().await.unwrap(), None);
        alerts.clear_sos().await.unwrap();
        assert_eq!(alerts.current_sos().await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreadable_alert_stays_visible_until_resolved() {
        let (storage, alerts) = store();
        storage
            .set_item(
                keys::CRITICAL_SOS_ALERT,
                "SOS from Patient Karan S. triggered at 10:00:00".into(),
            )
            .await
            .unwrap();
        let current = alerts.current_sos().await.unwrap().unwrap();
        assert_eq!(current.patient_name, "Karan S.");
        assert_eq!(current.triggered_at, None);

        storage
            .set_item(keys::CRITICAL_SOS_ALERT, "{\"broken\":".into())
            .await
            .unwrap();
        let current = alerts.current_sos().await.unwrap().unwrap();
        assert_eq!(current.patient_name, UNKNOWN_PATIENT);

        alerts.clear_sos().await.unwrap();
        assert_eq!(alerts.current_sos().await.unwrap(), None);
    }

    #[tokio::test]
    async fn blank_slot_is_no_alert() {
        let (storage, alerts) = store();
        storage
            .set_item(keys::CRITICAL_SOS_ALERT, "  ".into())
            .await
            .unwrap();
        assert_eq!(alerts.current_sos().await.unwrap(), None);
    }
}
