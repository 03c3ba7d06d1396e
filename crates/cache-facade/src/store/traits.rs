//! # Store Trait
//!
//! Backend interface the facade delegates to.
//! Implementations can be swapped for different backends (Redis, in-memory).

use async_trait::async_trait;

use crate::error::Result;

/// Raw key-value backend operations
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// GET: value stored under `key`, `None` if unset
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// SETEX: store `value` under `key`, expiring after `ttl_secs`
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// DEL: remove `key`, returning whether it existed
    async fn del(&self, key: &str) -> Result<bool>;

    /// PING: round trip used for health checks
    async fn ping(&self) -> Result<()>;
}
