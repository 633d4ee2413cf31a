pub mod cursor;
pub mod error;
pub mod event_bus;
pub mod metrics;
pub mod retry;
pub mod state;
pub mod store;
