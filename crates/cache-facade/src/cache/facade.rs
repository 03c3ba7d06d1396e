//! # Cache Facade
//!
//! Passthrough wrapper over a [`CacheStore`] exposing `get`, `set` with a
//! TTL, `delete`, and a liveness check.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use super::liveness::{ConnectionEvent, Lifecycle};
use super::monitor::HealthMonitor;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::store::CacheStore;

/// One shared backend connection plus its liveness flag
pub struct CacheFacade {
    store: Arc<dyn CacheStore>,
    lifecycle: Lifecycle,
    monitor: Option<HealthMonitor>,
}

impl std::fmt::Debug for CacheFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheFacade")
            .field("alive", &self.is_alive())
            .field("monitor", &self.monitor.is_some())
            .finish_non_exhaustive()
    }
}

impl CacheFacade {
    /// Build a Redis-backed facade and start tracking connection health.
    ///
    /// No I/O happens here. The connection is attempted in the background
    /// right away; if that fails the error is logged and `is_alive` turns
    /// false, and operations fail with [`CacheError::Connection`] until the
    /// server can be reached.
    ///
    /// # Errors
    ///
    /// Returns an error only if the configuration or URL is invalid.
    #[cfg(feature = "redis")]
    pub fn connect(config: &CacheConfig) -> Result<Self> {
        config.validate()?;

        let store = crate::store::RedisStore::open(&config.url, config.connect_timeout)?;
        tracing::info!(url = %config.url, "Redis client created");

        Ok(Self::with_store(store, config))
    }

    /// Build a facade over any store.
    ///
    /// A first health check runs in the background immediately. It keeps
    /// repeating when the config enables the health monitor. Both need a
    /// tokio runtime.
    pub fn with_store<S>(store: S, config: &CacheConfig) -> Self
    where
        S: CacheStore + 'static,
    {
        let store: Arc<dyn CacheStore> = Arc::new(store);
        let lifecycle = Lifecycle::new(config.event_capacity);

        let monitor = if config.monitor_enabled() {
            HealthMonitor::spawn(
                store.clone(),
                lifecycle.clone(),
                config.health_check_interval,
            )
        } else {
            HealthMonitor::spawn_once(store.clone(), lifecycle.clone())
        };
        if monitor.is_none() {
            tracing::warn!("No tokio runtime, connection health is only tracked by operations");
        }

        Self {
            store,
            lifecycle,
            monitor,
        }
    }

    /// Whether the backend connection is currently usable
    pub fn is_alive(&self) -> bool {
        self.lifecycle.is_alive()
    }

    /// Lifecycle driving the liveness flag
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Watch connection lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.lifecycle.subscribe()
    }

    /// Get the value stored under `key`, `None` if unset
    ///
    /// # Errors
    ///
    /// Fails on an empty key or when the backend call fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        ensure_key(key)?;
        tracing::debug!(key, "GET");

        let epoch = self.lifecycle.epoch();
        let result = self.store.get(key).await;
        self.observe(epoch, result)
    }

    /// Store `value` under `key`, expiring after `ttl`.
    ///
    /// The TTL is sent in whole seconds; any fractional part is dropped.
    ///
    /// # Errors
    ///
    /// Fails on an empty key, a TTL under one second, or when the backend
    /// call fails.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        ensure_key(key)?;
        let ttl_secs = ttl.as_secs();
        if ttl_secs == 0 {
            return Err(CacheError::InvalidTtl { ttl_secs });
        }
        tracing::debug!(key, ttl_secs, "SETEX");

        let epoch = self.lifecycle.epoch();
        let result = self.store.set_ex(key, value, ttl_secs).await;
        self.observe(epoch, result)
    }

    /// Remove `key`. Returns whether a key was actually removed.
    ///
    /// # Errors
    ///
    /// Fails on an empty key or when the backend call fails.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        ensure_key(key)?;
        tracing::debug!(key, "DEL");

        let epoch = self.lifecycle.epoch();
        let result = self.store.del(key).await;
        self.observe(epoch, result)
    }

    /// Transport failures mark the connection down; the error still goes back
    /// to the caller. A backend answer (success or a non-transport error)
    /// marks it up again unless another call failed in the meantime.
    fn observe<T>(&self, epoch: u64, result: Result<T>) -> Result<T> {
        match &result {
            Err(e) if e.is_transport() => {
                self.lifecycle.emit(ConnectionEvent::Error(e.to_string()));
            }
            _ => {
                self.lifecycle.restore_since(epoch);
            }
        }
        result
    }
}

fn ensure_key(key: &str) -> Result<()> {
    if key.is_empty() {
        Err(CacheError::EmptyKey)
    } else {
        Ok(())
    }
}

/// Shared cache facade
pub type SharedCache = Arc<CacheFacade>;

/// Wrap a facade for sharing across tasks
pub fn shared_cache(facade: CacheFacade) -> SharedCache {
    Arc::new(facade)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn facade() -> (CacheFacade, MemoryStore) {
        let store = MemoryStore::new();
        let config = CacheConfig::default().with_health_check_interval(Duration::ZERO);
        (CacheFacade::with_store(store.clone(), &config), store)
    }

    #[tokio::test]
    async fn test_alive_after_construction() {
        let (cache, _) = facade();
        assert!(cache.is_alive());
    }

    #[tokio::test]
    async fn test_error_and_connect_events() {
        let (cache, _) = facade();

        cache
            .lifecycle()
            .emit(ConnectionEvent::Error("ECONNREFUSED".into()));
        assert!(!cache.is_alive());

        cache.lifecycle().emit(ConnectionEvent::Connected);
        assert!(cache.is_alive());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let (cache, _) = facade();

        cache.set("k", "v", Duration::from_secs(10)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let (cache, _) = facade();

        cache.set("k", "v", Duration::from_secs(10)).await.unwrap();
        assert!(cache.delete("k").await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let (cache, _) = facade();
        assert!(!cache.delete("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_never_set() {
        let (cache, _) = facade();
        assert_eq!(cache.get("never-set").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let (cache, store) = facade();

        let err = cache.set("k", "v", Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidTtl { ttl_secs: 0 }));

        let err = cache
            .set("k", "v", Duration::from_millis(999))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidTtl { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let (cache, _) = facade();

        assert!(matches!(cache.get("").await, Err(CacheError::EmptyKey)));
        assert!(matches!(
            cache.set("", "v", Duration::from_secs(1)).await,
            Err(CacheError::EmptyKey)
        ));
        assert!(matches!(cache.delete("").await, Err(CacheError::EmptyKey)));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates_and_marks_down() {
        let (cache, store) = facade();
        store.set_reachable(false);

        let err = cache.get("k").await.unwrap_err();
        assert!(err.is_transport());
        assert!(!cache.is_alive());

        store.set_reachable(true);
        cache.set("k", "v", Duration::from_secs(10)).await.unwrap();
        assert!(cache.is_alive());
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_recovery_broadcasts_connected() {
        let (cache, store) = facade();
        store.set_reachable(false);
        let _ = cache.delete("k").await;
        let mut events = cache.subscribe();

        store.set_reachable(true);
        assert!(!cache.delete("k").await.unwrap());

        assert_eq!(events.recv().await.unwrap(), ConnectionEvent::Connected);
        assert!(cache.is_alive());
    }

    #[tokio::test]
    async fn test_failure_during_call_is_not_overwritten() {
        let (cache, _) = facade();
        let epoch = cache.lifecycle().epoch();

        cache
            .lifecycle()
            .emit(ConnectionEvent::Error("reset by peer".into()));
        let result: Result<()> = Ok(());
        cache.observe(epoch, result).unwrap();

        assert!(!cache.is_alive());
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_check_marks_down_without_monitor() {
        let store = MemoryStore::new();
        store.set_reachable(false);
        let config = CacheConfig::default().with_health_check_interval(Duration::ZERO);

        let cache = CacheFacade::with_store(store, &config);
        let mut events = cache.subscribe();
        assert!(cache.is_alive());

        assert!(matches!(
            events.recv().await.unwrap(),
            ConnectionEvent::Error(_)
        ));
        assert!(!cache.is_alive());
    }

    #[tokio::test]
    async fn test_validation_errors_keep_connection_up() {
        let (cache, _) = facade();

        let _ = cache.set("k", "v", Duration::ZERO).await;
        assert!(cache.is_alive());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_key_reads_as_absent() {
        let (cache, _) = facade();

        cache.set("k", "v", Duration::from_secs(10)).await.unwrap();
        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_started_from_config() {
        let store = MemoryStore::new();
        let config = CacheConfig::default().with_health_check_interval(Duration::from_secs(1));
        let cache = CacheFacade::with_store(store.clone(), &config);
        let mut events = cache.subscribe();

        store.set_reachable(false);
        assert!(matches!(
            events.recv().await.unwrap(),
            ConnectionEvent::Error(_)
        ));
        assert!(!cache.is_alive());
    }

    #[tokio::test]
    async fn test_shared_across_tasks() {
        let (cache, _) = facade();
        let cache = shared_cache(cache);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    let key = format!("key:{i}");
                    cache
                        .set(&key, &i.to_string(), Duration::from_secs(30))
                        .await
                        .unwrap();
                    cache.get(&key).await.unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), Some(i.to_string()));
        }
    }
}
