//! # Cache Module
//!
//! The cache facade and the connection health tracking behind `is_alive`.

pub mod facade;
pub mod liveness;
pub mod monitor;

pub use facade::{CacheFacade, SharedCache, shared_cache};
pub use liveness::{ConnectionEvent, Lifecycle, Liveness};
pub use monitor::HealthMonitor;
