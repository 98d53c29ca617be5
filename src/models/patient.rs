//! Admitted patients shown on the staff dashboard.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub room: String,
    pub condition: String,
    pub last_update: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConditionSeverity {
    Critical,
    Stable,
    Fair,
    Unknown,
}

impl ConditionSeverity {
    pub fn classify(condition: &str) -> Self {
        match condition.trim().to_lowercase().as_str() {
            "critical" | "serious" => ConditionSeverity::Critical,
            "stable" | "improving" => ConditionSeverity::Stable,
            "fair" => ConditionSeverity::Fair,
            _ => ConditionSeverity::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConditionSeverity::Critical => "critical",
            ConditionSeverity::Stable => "stable",
            ConditionSeverity::Fair => "fair",
            ConditionSeverity::Unknown => "unknown",
        }
    }
}

impl Patient {
    pub fn severity(&self) -> ConditionSeverity {
        ConditionSeverity::classify(&self.condition)
    }

    pub fn is_critical(&self) -> bool {
        self.severity() == ConditionSeverity::Critical
    }
}

/// Raw admission form fields, exactly as typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionInput {
    pub id: String,
    pub name: String,
    pub ward: String,
    pub condition: String,
    pub age: String,
}
