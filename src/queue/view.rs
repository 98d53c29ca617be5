//! Display ordering of the waiting queue.
//!
//! Display positions are recomputed on every read and are never a removal key;
//! a resolve action always carries the request `id`.

use serde::Serialize;

use crate::models::{DoctorRequest, PriorityTier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// 1-based position in the current sorted order.
    pub display_index: usize,
    pub request: DoctorRequest,
}

impl QueueEntry {
    pub fn label(&self) -> String {
        format!("#{}", self.display_index)
    }

    pub fn tier(&self) -> PriorityTier {
        self.request.criticality.tier()
    }
}

/// What the waiting-queue panel shows: either the placeholder or ordered rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "entries", rename_all = "camelCase")]
pub enum QueueView {
    Clear,
    Entries(Vec<QueueEntry>),
}

impl QueueView {
    pub const CLEAR_MESSAGE: &'static str = "Queue is clear.";

    pub fn from_entries(entries: Vec<QueueEntry>) -> Self {
        if entries.is_empty() {
            QueueView::Clear
        } else {
            QueueView::Entries(entries)
        }
    }

    pub fn entries(&self) -> &[QueueEntry] {
        match self {
            QueueView::Clear => &[],
            QueueView::Entries(entries) => entries,
        }
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, QueueView::Clear)
    }
}

impl Default for QueueView {
    fn default() -> Self {
        QueueView::Clear
    }
}

/// Sorts by criticality rank, then by `id` so equal tiers keep creation order.
pub fn order_requests(mut requests: Vec<DoctorRequest>) -> Vec<QueueEntry> {
    requests.sort_by_key(DoctorRequest::sort_key);
    requests
        .into_iter()
        .enumerate()
        .map(|(position, request)| QueueEntry {
            display_index: position + 1,
            request,
        })
        .collect()
}
