//! # Cache Facade Library
//!
//! Minimal wrapper around a Redis client: `get`, `set` with expiration,
//! `delete`, and an `is_alive` connectivity check.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Application Layer                        │
//! │            (holds one Arc<CacheFacade> from startup)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       CacheFacade                            │
//! │        get / set / delete          is_alive ◄── Lifecycle    │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   ▲
//!                    ▼                   │ Connected / Error
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │   CacheStore (Redis)    │◄──│       HealthMonitor          │
//! │   GET / SETEX / DEL     │   │     (periodic PING)          │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `redis`: Enable the Redis backend (default)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use cache_facade::{CacheConfig, CacheFacade, shared_cache};
//!
//! let cache = shared_cache(CacheFacade::connect(&CacheConfig::from_env())?);
//!
//! cache.set("session:42", "alice", Duration::from_secs(3600)).await?;
//! let user = cache.get("session:42").await?;
//! assert!(cache.is_alive());
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use cache::{
    CacheFacade, ConnectionEvent, HealthMonitor, Lifecycle, Liveness, SharedCache, shared_cache,
};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
#[cfg(feature = "redis")]
pub use store::RedisStore;
pub use store::{CacheStore, MemoryStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build a shared facade with configuration read from the environment
///
/// # Errors
///
/// Returns an error if the configuration is invalid. An unreachable server is
/// reported through `is_alive`, not here.
#[cfg(feature = "redis")]
pub fn init_from_env() -> Result<SharedCache> {
    let facade = CacheFacade::connect(&CacheConfig::from_env())?;
    Ok(shared_cache(facade))
}
