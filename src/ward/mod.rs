//! Staff-side administration that shares the page store with the alert surface.

pub mod patients;
pub mod staffing;
pub mod supplies;

pub use patients::{Census, PatientRegistry};
pub use staffing::{StaffCounts, StaffingBoard, StaffType};
pub use supplies::{CylinderRequest, SupplyDesk};
