//! # Health Monitor
//!
//! Background task that pings the backend on a fixed interval and turns the
//! outcome into lifecycle events: a failed PING emits `Error`, a successful
//! PING while marked down emits `Connected`. The first check runs right away,
//! which for a lazily connecting store is the initial connection attempt.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::liveness::{ConnectionEvent, Lifecycle};
use crate::store::CacheStore;

/// Handle to the running monitor task. Dropping it stops the task.
#[derive(Debug)]
pub struct HealthMonitor {
    handle: JoinHandle<()>,
}

impl HealthMonitor {
    /// Spawn the monitor on the current tokio runtime.
    ///
    /// Returns `None` when called outside a runtime.
    pub fn spawn(
        store: Arc<dyn CacheStore>,
        lifecycle: Lifecycle,
        interval: Duration,
    ) -> Option<Self> {
        let runtime = tokio::runtime::Handle::try_current().ok()?;

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                check_once(store.as_ref(), &lifecycle).await;
            }
        });

        tracing::debug!(?interval, "Health monitor started");
        Some(Self { handle })
    }

    /// Spawn a single check on the current tokio runtime, for when periodic
    /// monitoring is off.
    ///
    /// Returns `None` when called outside a runtime.
    pub fn spawn_once(store: Arc<dyn CacheStore>, lifecycle: Lifecycle) -> Option<Self> {
        let runtime = tokio::runtime::Handle::try_current().ok()?;

        let handle = runtime.spawn(async move {
            check_once(store.as_ref(), &lifecycle).await;
        });

        Some(Self { handle })
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Ping once and emit the matching event. Returns whether the ping succeeded.
pub async fn check_once(store: &dyn CacheStore, lifecycle: &Lifecycle) -> bool {
    let epoch = lifecycle.epoch();

    match store.ping().await {
        Ok(()) => {
            lifecycle.restore_since(epoch);
            true
        }
        Err(e) => {
            lifecycle.emit(ConnectionEvent::Error(e.to_string()));
            false
        }
    }
}
