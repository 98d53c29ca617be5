//! Doctor-connect requests raised from the patient console.
//!
//! Stored field names follow the layout already present in page storage
//! (`id`, `name`, `reason`, `criticality`, `timestamp`).

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Urgency tier chosen by the patient. Anything outside HIGH/MEDIUM/LOW is kept
/// verbatim (upper-cased) and ranks after LOW.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Criticality {
    High,
    Medium,
    Low,
    Unrecognized(String),
}

impl Criticality {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_uppercase();
        match normalized.as_str() {
            "HIGH" => Criticality::High,
            "MEDIUM" => Criticality::Medium,
            "LOW" => Criticality::Low,
            _ => Criticality::Unrecognized(normalized),
        }
    }

    /// Sort rank, lower is more urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Criticality::High => 0,
            Criticality::Medium => 1,
            Criticality::Low => 2,
            Criticality::Unrecognized(_) => 3,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Criticality::High => "HIGH",
            Criticality::Medium => "MEDIUM",
            Criticality::Low => "LOW",
            Criticality::Unrecognized(raw) => raw,
        }
    }

    /// Styling bucket for the rendered row. URGENT is styled like HIGH even though
    /// it sorts with the unrecognized values.
    pub fn tier(&self) -> PriorityTier {
        match self {
            Criticality::High => PriorityTier::High,
            Criticality::Unrecognized(raw) if raw == "URGENT" => PriorityTier::High,
            Criticality::Medium => PriorityTier::Medium,
            _ => PriorityTier::Low,
        }
    }
}

impl From<String> for Criticality {
    fn from(raw: String) -> Self {
        Criticality::parse(&raw)
    }
}

impl From<Criticality> for String {
    fn from(criticality: Criticality) -> Self {
        criticality.as_str().to_string()
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

/// One pending request for clinical attention. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorRequest {
    /// Creation time in epoch milliseconds; unique within the queue and the only
    /// handle used for removal.
    pub id: i64,
    #[serde(rename = "name", alias = "patientName")]
    pub patient_name: String,
    pub reason: String,
    pub criticality: Criticality,
    /// ISO 8601 datetime, informational only.
    #[serde(rename = "timestamp", alias = "createdAt", default)]
    pub created_at: String,
}

impl DoctorRequest {
    pub fn new(
        id: i64,
        patient_name: impl Into<String>,
        reason: impl Into<String>,
        criticality: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            patient_name: patient_name.into(),
            reason: reason.into(),
            criticality: Criticality::parse(criticality),
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Display ordering: criticality rank first, then creation order.
    pub fn sort_key(&self) -> (u8, i64) {
        (self.criticality.rank(), self.id)
    }

    pub fn created_at_time(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.id)
    }
}
