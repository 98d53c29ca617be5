use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Name shown when the stored alert does not say who raised it.
pub const UNKNOWN_PATIENT: &str = "Unknown Patient";

const MESSAGE_PREFIX: &str = "SOS from Patient ";
const MESSAGE_TIME_SEPARATOR: &str = " triggered at ";

/// The single active SOS. A new SOS replaces it; resolving removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosAlert {
    pub patient_name: String,
    /// Absent only for alerts recovered from unreadable stored text.
    #[serde(default)]
    pub triggered_at: Option<DateTime<Utc>>,
}

impl SosAlert {
    pub fn new(patient_name: impl Into<String>, triggered_at: DateTime<Utc>) -> Self {
        Self {
            patient_name: patient_name.into(),
            triggered_at: Some(triggered_at),
        }
    }

    /// Best-effort alert for a slot whose contents are not a stored record.
    /// Banner text (`SOS from Patient <name> triggered at <time>`) keeps its
    /// name; anything else becomes [`UNKNOWN_PATIENT`]. The time is dropped.
    pub fn from_unreadable(raw: &str) -> Self {
        let patient_name = raw
            .trim()
            .strip_prefix(MESSAGE_PREFIX)
            .and_then(|rest| rest.rsplit_once(MESSAGE_TIME_SEPARATOR))
            .map(|(name, _)| name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_PATIENT);

        Self {
            patient_name: patient_name.to_string(),
            triggered_at: None,
        }
    }

    /// Wall-clock time of the trigger in the viewer's timezone.
    pub fn local_time(&self) -> Option<String> {
        self.triggered_at
            .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
    }

    /// Banner text in the wording staff are used to.
    pub fn message(&self) -> String {
        format!(
            "{MESSAGE_PREFIX}{}{MESSAGE_TIME_SEPARATOR}{}",
            self.patient_name,
            self.local_time().unwrap_or_else(|| "an unknown time".into())
        )
    }
}
