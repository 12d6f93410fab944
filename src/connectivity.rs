//! Connectivity monitor - publishes the online/offline signal.
//!
//! The runtime environment reports online/offline transitions; this monitor
//! turns them into a watch channel the session controller subscribes to.
//! "Offline" is a global gate: every mutating operation short-circuits on it
//! before attempting network I/O, and the controller reconciles state when
//! the signal flips back to online.

use tokio::sync::watch;
use tracing::info;

/// Tracks online/offline transitions and publishes them as a boolean signal.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    /// Creates a monitor with the given initial state.
    #[must_use]
    pub fn new(initially_online: bool) -> Self {
        let (tx, _) = watch::channel(initially_online);
        Self { tx }
    }

    /// Publishes a transition. Subscribers are only notified when the state
    /// actually changes.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|state| {
            if *state == online {
                false
            } else {
                *state = online;
                true
            }
        });
        if changed {
            info!(
                "Connectivity changed: {}",
                if online { "online" } else { "offline" }
            );
        }
    }

    /// Current state of the signal.
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Subscribes to transitions; the receiver also exposes the current
    /// state via `borrow`.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}
