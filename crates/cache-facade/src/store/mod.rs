//! # Store Module
//!
//! Backend implementations behind the [`CacheStore`] trait.

pub mod memory_impl;
#[cfg(feature = "redis")]
pub mod redis_impl;
pub mod traits;

pub use memory_impl::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_impl::RedisStore;
pub use traits::CacheStore;
