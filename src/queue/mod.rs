pub mod store;
pub mod view;

pub use store::RequestQueue;
pub use view::{order_requests, QueueEntry, QueueView};
