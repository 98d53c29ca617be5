use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;

use crate::{
    alerts::AlertStore,
    db::PageStorage,
    error::CareResult,
    models::SosAlert,
    queue::{QueueView, RequestQueue},
};

/// Everything the staff dashboard renders on one refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub sos: Option<SosAlert>,
    pub queue: QueueView,
    pub refreshed_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn empty() -> Self {
        Self {
            sos: None,
            queue: QueueView::Clear,
            refreshed_at: Utc::now(),
        }
    }

    /// Same alert and same rows, ignoring when it was read.
    pub fn same_content(&self, other: &DashboardSnapshot) -> bool {
        self.sos == other.sos && self.queue == other.queue
    }
}

/// Read side of the staff dashboard plus the two resolve actions.
#[derive(Clone)]
pub struct Dashboard<S> {
    alerts: AlertStore<S>,
    queue: RequestQueue<S>,
}

impl<S: PageStorage> Dashboard<S> {
    pub fn new(storage: S) -> Self {
        Self {
            alerts: AlertStore::new(storage.clone()),
            queue: RequestQueue::new(storage),
        }
    }

    /// Full re-read of both stores. A failed read shows as "nothing pending"
    /// for this refresh instead of failing it.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        let sos = self.alerts.current_sos().await.unwrap_or_else(|err| {
            warn!("SOS slot unreadable, showing no alert: {err}");
            None
        });
        let queue = self.queue.render().await.unwrap_or_else(|err| {
            warn!("Doctor request queue unreadable, showing it as clear: {err}");
            QueueView::Clear
        });

        DashboardSnapshot {
            sos,
            queue,
            refreshed_at: Utc::now(),
        }
    }

    pub async fn resolve_request(&self, id: i64) -> CareResult<bool> {
        self.queue.resolve(id).await
    }

    pub async fn resolve_sos(&self) -> CareResult<()> {
        self.alerts.clear_sos().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{keys, MemoryStorage};

    #[tokio::test]
    async fn first_run_without_data_is_empty() {
        let dashboard = Dashboard::new(MemoryStorage::new());
        let snapshot = dashboard.snapshot().await;
        assert!(snapshot.same_content(&DashboardSnapshot::empty()));
    }

    #[tokio::test]
    async fn malformed_data_degrades_to_placeholders() {
        let storage = MemoryStorage::new();
        storage
            .set_item(keys::DOCTOR_REQUEST_QUEUE, "{".into())
            .await
            .unwrap();
        storage
            .set_item(keys::CRITICAL_SOS_ALERT, "[]".into())
            .await
            .unwrap();

        let snapshot = Dashboard::new(storage).snapshot().await;
        let sos = snapshot.sos.expect("undecodable SOS is still shown");
        assert_eq!(sos.patient_name, crate::models::sos::UNKNOWN_PATIENT);
        assert!(snapshot.queue.is_clear());
    }

    #[tokio::test]
    async fn snapshot_reflects_both_stores() {
        let storage = MemoryStorage::new();
        let alerts = AlertStore::new(storage.clone());
        let queue = RequestQueue::new(storage.clone());
        alerts.raise_sos("Karan S.", Utc::now()).await.unwrap();
        let low = queue.submit("Ria V.", "Refill", "low").await.unwrap();
        let high = queue.submit("Manish R.", "Breathless", "high").await.unwrap();

        let dashboard = Dashboard::new(storage);
        let snapshot = dashboard.snapshot().await;
        assert_eq!(snapshot.sos.as_ref().map(|s| s.patient_name.as_str()), Some("Karan S."));
        let ids: Vec<i64> = snapshot.queue.entries().iter().map(|e| e.request.id).collect();
        assert_eq!(ids, vec![high.id, low.id]);

        assert!(dashboard.resolve_request(high.id).await.unwrap());
        dashboard.resolve_sos().await.unwrap();
        let snapshot = dashboard.snapshot().await;
        assert_eq!(snapshot.sos, None);
        assert_eq!(snapshot.queue.entries().len(), 1);
        assert_eq!(snapshot.queue.entries()[0].display_index, 1);
    }
}
