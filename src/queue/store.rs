use chrono::Utc;
use log::{info, warn};

use crate::{
    db::{
        helpers::{decode_or_default, encode},
        keys, ItemWrite, PageStorage,
    },
    error::{CareError, CareResult},
    models::DoctorRequest,
};

use super::view::{order_requests, QueueEntry, QueueView};

/// Pending doctor requests, persisted as one JSON array in insertion order.
#[derive(Clone)]
pub struct RequestQueue<S> {
    storage: S,
}

impl<S: PageStorage> RequestQueue<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Appends a prepared request. A request whose `id` is already queued is
    /// rejected before anything is written.
    pub async fn enqueue(&self, request: DoctorRequest) -> CareResult<()> {
        let id = request.id;
        self.storage
            .update_item(keys::DOCTOR_REQUEST_QUEUE, move |raw| {
                let mut queue: Vec<DoctorRequest> =
                    decode_or_default(keys::DOCTOR_REQUEST_QUEUE, raw);
                if queue.iter().any(|queued| queued.id == request.id) {
                    return Err(anyhow::Error::new(CareError::DuplicateKey(format!(
                        "Doctor request {}",
                        request.id
                    ))));
                }
                queue.push(request);
                Ok((ItemWrite::Set(encode(keys::DOCTOR_REQUEST_QUEUE, &queue)?), ()))
            })
            .await?;

        info!("Queued doctor request {id}");
        self.drop_legacy_slot().await;
        Ok(())
    }

    /// Creates and queues a request from console input. The new `id` is the
    /// current epoch millisecond, bumped past the newest queued id if needed.
    pub async fn submit(
        &self,
        patient_name: &str,
        reason: &str,
        criticality: &str,
    ) -> CareResult<DoctorRequest> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CareError::validation(
                "Request cancelled: a reason for the doctor connection is required.",
            ));
        }
        if criticality.trim().is_empty() {
            return Err(CareError::validation(
                "Request cancelled: criticality (Low, Medium, High) is required.",
            ));
        }

        let patient_name = patient_name.to_string();
        let reason = reason.to_string();
        let criticality = criticality.to_string();

        let request = self
            .storage
            .update_item(keys::DOCTOR_REQUEST_QUEUE, move |raw| {
                let mut queue: Vec<DoctorRequest> =
                    decode_or_default(keys::DOCTOR_REQUEST_QUEUE, raw);

                let now = Utc::now();
                let now_ms = now.timestamp_millis();
                let id = match queue.iter().map(|queued| queued.id).max() {
                    Some(last) if last >= now_ms => last.checked_add(1).ok_or_else(|| {
                        anyhow::Error::new(CareError::validation(
                            "No request id is left after the newest queued request.",
                        ))
                    })?,
                    _ => now_ms,
                };

                let request = DoctorRequest::new(id, patient_name, reason, &criticality, now);
                queue.push(request.clone());
                Ok((
                    ItemWrite::Set(encode(keys::DOCTOR_REQUEST_QUEUE, &queue)?),
                    request,
                ))
            })
            .await?;

        info!(
            "Doctor request {} sent for {} (criticality {})",
            request.id, request.patient_name, request.criticality
        );
        self.drop_legacy_slot().await;
        Ok(request)
    }

    /// All pending requests in insertion order.
    pub async fn list(&self) -> CareResult<Vec<DoctorRequest>> {
        let raw = self.storage.get_item(keys::DOCTOR_REQUEST_QUEUE).await?;
        self.drop_legacy_slot().await;
        Ok(decode_or_default(keys::DOCTOR_REQUEST_QUEUE, raw.as_deref()))
    }

    /// Removes the request with `id`. Returns whether anything was removed;
    /// resolving an id that is already gone is not an error.
    pub async fn resolve(&self, id: i64) -> CareResult<bool> {
        let removed = self
            .storage
            .update_item(keys::DOCTOR_REQUEST_QUEUE, move |raw| {
                let mut queue: Vec<DoctorRequest> =
                    decode_or_default(keys::DOCTOR_REQUEST_QUEUE, raw);
                let before = queue.len();
                queue.retain(|queued| queued.id != id);
                if queue.len() == before {
                    return Ok((ItemWrite::Keep, false));
                }
                Ok((ItemWrite::Set(encode(keys::DOCTOR_REQUEST_QUEUE, &queue)?), true))
            })
            .await?;

        if removed {
            info!("Resolved doctor request {id}");
        } else {
            info!("Doctor request {id} already resolved");
        }
        self.drop_legacy_slot().await;
        Ok(removed)
    }

    pub async fn ordered_view(&self) -> CareResult<Vec<QueueEntry>> {
        Ok(order_requests(self.list().await?))
    }

    pub async fn render(&self) -> CareResult<QueueView> {
        Ok(QueueView::from_entries(self.ordered_view().await?))
    }

    async fn drop_legacy_slot(&self) {
        if let Err(err) = self
            .storage
            .remove_item(keys::LEGACY_DOCTOR_REQUEST_ALERT)
            .await
        {
            warn!("Failed to clear legacy doctor request slot: {err:#}");
        }
    }
}
