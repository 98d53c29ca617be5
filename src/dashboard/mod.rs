pub mod controller;
pub mod loop_worker;
pub mod snapshot;

pub use controller::DashboardController;
pub use snapshot::{Dashboard, DashboardSnapshot};
