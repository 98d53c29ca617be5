pub mod doctor_request;
pub mod goals;
pub mod patient;
pub mod sos;

pub use doctor_request::{Criticality, DoctorRequest, PriorityTier};
pub use goals::{GoalProgress, Goals};
pub use patient::{AdmissionInput, ConditionSeverity, Patient};
pub use sos::SosAlert;
