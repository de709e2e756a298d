//! Subscription registry: who watches which symbol, and loop lifecycle.
//!
//! The registry tracks three things under one lock: connected viewers and
//! their channels, per-symbol subscriber sets, and the running broadcast
//! loops. A symbol's loop starts when its subscriber set goes from empty to
//! one and is cancelled when it drains back to empty, so exactly as many
//! loops run as there are symbols being watched.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::mpsc;

use crate::aggregator::Aggregator;
use crate::models::{normalize_symbol, PriceUpdate, ViewerId};

use super::broadcast::{spawn_broadcast_loop, BroadcastHandle};

/// Per-viewer channel depth. A viewer that falls this far behind starts
/// losing updates, which beats stalling every other viewer of the symbol.
pub const VIEWER_CHANNEL_CAPACITY: usize = 64;

/// Everything the registry mutates, behind one lock. Viewer channels,
/// subscriber sets and loop handles move together; splitting them would
/// invite states like a loop with no subscriber entry.
pub(crate) struct RegistryState {
    viewers: HashMap<ViewerId, mpsc::Sender<PriceUpdate>>,
    subscriptions: HashMap<String, HashSet<ViewerId>>,
    loops: HashMap<String, BroadcastHandle>,
}

impl RegistryState {
    pub(crate) fn new() -> Self {
        Self {
            viewers: HashMap::new(),
            subscriptions: HashMap::new(),
            loops: HashMap::new(),
        }
    }

    /// Snapshot of the channels subscribed to `symbol` at this instant.
    /// The broadcast loop pushes to the snapshot after releasing the lock,
    /// so a viewer leaving mid-push merely ignores one stale update.
    pub(crate) fn subscribers_of(&self, symbol: &str) -> Vec<mpsc::Sender<PriceUpdate>> {
        let Some(viewers) = self.subscriptions.get(symbol) else {
            return Vec::new();
        };
        viewers
            .iter()
            .filter_map(|id| self.viewers.get(id).cloned())
            .collect()
    }
}

/// Registry of viewers, subscriptions and broadcast loops.
///
/// All methods are synchronous and cheap; they must be called from within a
/// Tokio runtime because subscribing may spawn a broadcast loop.
pub struct SubscriptionRegistry {
    state: Arc<Mutex<RegistryState>>,
    aggregator: Arc<Aggregator>,
    poll_interval: Duration,
    next_viewer: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new(aggregator: Arc<Aggregator>, poll_interval: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState::new())),
            aggregator,
            poll_interval,
            next_viewer: AtomicU64::new(1),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Subscription registry lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Registers a viewer and hands back its update channel.
    pub fn connect(&self) -> (ViewerId, mpsc::Receiver<PriceUpdate>) {
        let viewer = self.next_viewer.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(VIEWER_CHANNEL_CAPACITY);

        self.lock_state().viewers.insert(viewer, tx);
        debug!("Viewer {} connected", viewer);
        (viewer, rx)
    }

    /// Adds `viewer` to the symbol's subscriber set, starting the broadcast
    /// loop when the set was empty. Subscribing twice is a no-op.
    pub fn subscribe(&self, viewer: ViewerId, symbol: &str) {
        let symbol = normalize_symbol(symbol);
        let mut state = self.lock_state();

        if !state.viewers.contains_key(&viewer) {
            warn!("Subscribe to {} from unknown viewer {}", symbol, viewer);
            return;
        }

        if !state
            .subscriptions
            .entry(symbol.clone())
            .or_default()
            .insert(viewer)
        {
            debug!("Viewer {} already subscribed to {}", viewer, symbol);
            return;
        }
        debug!("Viewer {} subscribed to {}", viewer, symbol);

        if !state.loops.contains_key(&symbol) {
            let handle = spawn_broadcast_loop(
                symbol.clone(),
                Arc::clone(&self.aggregator),
                Arc::clone(&self.state),
                self.poll_interval,
            );
            state.loops.insert(symbol, handle);
        }
    }

    /// Drops one subscription. When the symbol's subscriber set drains, its
    /// broadcast loop is cancelled. Unsubscribing when not subscribed is a
    /// no-op.
    pub fn unsubscribe(&self, viewer: ViewerId, symbol: &str) {
        let symbol = normalize_symbol(symbol);
        let mut state = self.lock_state();
        Self::remove_subscription(&mut state, viewer, &symbol);
    }

    /// Removes a viewer entirely: channel, every subscription, and any loop
    /// left without subscribers.
    pub fn disconnect(&self, viewer: ViewerId) {
        let mut state = self.lock_state();
        if state.viewers.remove(&viewer).is_none() {
            return;
        }

        let symbols: Vec<String> = state
            .subscriptions
            .iter()
            .filter(|(_, viewers)| viewers.contains(&viewer))
            .map(|(symbol, _)| symbol.clone())
            .collect();

        for symbol in symbols {
            Self::remove_subscription(&mut state, viewer, &symbol);
        }
        debug!("Viewer {} disconnected", viewer);
    }

    pub fn subscriber_count(&self, symbol: &str) -> usize {
        let symbol = normalize_symbol(symbol);
        self.lock_state()
            .subscriptions
            .get(&symbol)
            .map_or(0, HashSet::len)
    }

    pub fn has_loop(&self, symbol: &str) -> bool {
        let symbol = normalize_symbol(symbol);
        self.lock_state().loops.contains_key(&symbol)
    }

    pub fn active_loops(&self) -> usize {
        self.lock_state().loops.len()
    }

    fn remove_subscription(state: &mut RegistryState, viewer: ViewerId, symbol: &str) {
        let became_empty = match state.subscriptions.get_mut(symbol) {
            Some(viewers) => {
                if !viewers.remove(&viewer) {
                    return;
                }
                debug!("Viewer {} unsubscribed from {}", viewer, symbol);
                viewers.is_empty()
            }
            None => return,
        };

        if became_empty {
            state.subscriptions.remove(symbol);
            if let Some(handle) = state.loops.remove(symbol) {
                debug!("Last subscriber left {}, stopping broadcast loop", symbol);
                handle.cancel();
            }
        }
    }
}

impl Drop for SubscriptionRegistry {
    fn drop(&mut self) {
        let mut state = self.lock_state();
        for (_, handle) in state.loops.drain() {
            handle.cancel();
        }
    }
}
