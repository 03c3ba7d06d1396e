//! # Cache Probe
//!
//! Connectivity check for the cache facade: runs a set/get/delete round trip
//! on a scratch key and reports liveness afterwards.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

use std::time::{Duration, Instant};

use cache_facade::{CacheFacade, ConnectionEvent};
use tokio::sync::broadcast::error::RecvError;

/// Outcome of one probe round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Liveness flag after the round trip
    pub alive: bool,
    /// Value read back matched the value written
    pub read_back: bool,
    /// Delete removed the scratch key
    pub deleted: bool,
    /// Total round trip time
    pub elapsed: Duration,
}

impl ProbeReport {
    pub fn is_healthy(&self) -> bool {
        self.alive && self.read_back && self.deleted
    }
}

/// Write, read back and delete `key`.
///
/// # Errors
///
/// Returns the first cache error hit during the round trip.
pub async fn run_probe(
    cache: &CacheFacade,
    key: &str,
    ttl: Duration,
) -> cache_facade::Result<ProbeReport> {
    let start = Instant::now();
    let value = format!("probe-{}", std::process::id());

    cache.set(key, &value, ttl).await?;
    let read_back = cache.get(key).await?.as_deref() == Some(value.as_str());
    let deleted = cache.delete(key).await?;

    Ok(ProbeReport {
        alive: cache.is_alive(),
        read_back,
        deleted,
        elapsed: start.elapsed(),
    })
}

/// Log lifecycle events for `duration`, returning how many were seen.
pub async fn watch(cache: &CacheFacade, duration: Duration) -> usize {
    let mut events = cache.subscribe();
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);
    let mut seen = 0;

    loop {
        tokio::select! {
            () = &mut deadline => break,
            event = events.recv() => match event {
                Ok(ConnectionEvent::Connected) => {
                    seen += 1;
                    tracing::info!(alive = cache.is_alive(), "Connection up");
                }
                Ok(ConnectionEvent::Error(reason)) => {
                    seen += 1;
                    tracing::warn!(alive = cache.is_alive(), error = %reason, "Connection down");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Lifecycle events dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use cache_facade::{CacheConfig, MemoryStore};

    fn facade(store: &MemoryStore) -> CacheFacade {
        let config = CacheConfig::default().with_health_check_interval(Duration::ZERO);
        CacheFacade::with_store(store.clone(), &config)
    }

    #[tokio::test]
    async fn test_probe_healthy() {
        let store = MemoryStore::new();
        let cache = facade(&store);

        let report = run_probe(&cache, "probe", Duration::from_secs(10))
            .await
            .unwrap();

        assert!(report.is_healthy());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_probe_fails_when_unreachable() {
        let store = MemoryStore::new();
        let cache = facade(&store);
        store.set_reachable(false);

        let err = run_probe(&cache, "probe", Duration::from_secs(10))
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert!(!cache.is_alive());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_counts_events() {
        let store = MemoryStore::new();
        let cache = facade(&store);

        let watcher = watch(&cache, Duration::from_secs(5));
        let emitter = async {
            tokio::task::yield_now().await;
            cache
                .lifecycle()
                .emit(ConnectionEvent::Error("reset by peer".into()));
            cache.lifecycle().emit(ConnectionEvent::Connected);
        };

        let (seen, ()) = tokio::join!(watcher, emitter);
        assert_eq!(seen, 2);
    }
}
