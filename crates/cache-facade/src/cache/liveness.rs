//! # Connection Liveness
//!
//! Two-state liveness flag (connected / disconnected) driven by connection
//! lifecycle events. Events are also broadcast so other parts of an
//! application can watch connection health.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

/// Connection lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The backend answered; connection is usable
    Connected,
    /// The transport failed, with the reason reported by the client
    Error(String),
}

/// Shared liveness flag. Starts out connected.
///
/// The low bit holds the flag; the remaining bits count error events, so a
/// recovery can be made conditional on no error having happened since the
/// observation that justified it.
#[derive(Debug, Clone)]
pub struct Liveness {
    state: Arc<AtomicU64>,
}

const ALIVE: u64 = 1;

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU64::new(ALIVE)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state.load(Ordering::Acquire) & ALIVE == ALIVE
    }

    /// Number of error events seen so far
    pub fn epoch(&self) -> u64 {
        self.state.load(Ordering::Acquire) >> 1
    }

    /// Mark down and bump the epoch. Returns whether it was up.
    fn mark_down(&self) -> bool {
        let prev = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                Some(((state >> 1).wrapping_add(1)) << 1)
            })
            .unwrap_or_else(|state| state);
        prev & ALIVE == ALIVE
    }

    /// Mark up unconditionally. Returns whether it was up.
    fn mark_up(&self) -> bool {
        self.state.fetch_or(ALIVE, Ordering::AcqRel) & ALIVE == ALIVE
    }

    /// Mark up only if down and no error arrived after `epoch`.
    fn mark_up_since(&self, epoch: u64) -> bool {
        self.state
            .compare_exchange(epoch << 1, (epoch << 1) | ALIVE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Applies lifecycle events to a [`Liveness`] flag and fans them out to
/// subscribers.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    liveness: Liveness,
    events_tx: broadcast::Sender<ConnectionEvent>,
}

impl Lifecycle {
    /// Create a lifecycle whose broadcast channel holds `capacity` events.
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (events_tx, _) = broadcast::channel(capacity.max(1));

        Self {
            liveness: Liveness::new(),
            events_tx,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    pub fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    /// Apply `event` to the liveness flag, log it, then broadcast it.
    ///
    /// The flag is updated before this returns, so `is_alive` observes the
    /// event immediately.
    pub fn emit(&self, event: ConnectionEvent) {
        match &event {
            ConnectionEvent::Error(reason) => {
                if self.liveness.mark_down() {
                    tracing::error!(error = %reason, "Redis client error, marking connection down");
                } else {
                    tracing::debug!(error = %reason, "Redis client error while already down");
                }
            }
            ConnectionEvent::Connected => {
                if self.liveness.mark_up() {
                    tracing::debug!("Redis connect event while already up");
                } else {
                    tracing::info!("Redis connection re-established");
                }
            }
        }

        // No subscribers is fine; the flag is the source of truth.
        let _ = self.events_tx.send(event);
    }

    /// Error epoch to pass to [`Lifecycle::restore_since`] once the call
    /// started now has succeeded
    pub fn epoch(&self) -> u64 {
        self.liveness.epoch()
    }

    /// Emit `Connected` after a successful backend call, but only if the
    /// connection is marked down and no error was emitted since `epoch`.
    /// Returns whether the flag flipped.
    pub fn restore_since(&self, epoch: u64) -> bool {
        if !self.liveness.mark_up_since(epoch) {
            return false;
        }

        tracing::info!("Redis connection re-established");
        let _ = self.events_tx.send(ConnectionEvent::Connected);
        true
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events_tx.subscribe()
    }
}
