//! Per-symbol broadcast loop.
//!
//! One loop per actively watched symbol. Each tick fetches through the
//! aggregator (so the cache and fallback chain apply), snapshots the
//! subscriber set, and pushes a [`PriceUpdate`] to every viewer channel.
//! The registry owns loop lifecycle; the loop itself only reacts to its
//! cancellation token.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::aggregator::Aggregator;
use crate::models::PriceUpdate;

use super::registry::RegistryState;

/// Handle to one symbol's running broadcast loop.
pub(crate) struct BroadcastHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl BroadcastHandle {
    /// Signals the loop to stop. Safe to call more than once.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns the broadcast loop for `symbol`. The first tick fires
/// immediately, so new watchers see a price without waiting a full
/// interval.
pub(crate) fn spawn_broadcast_loop(
    symbol: String,
    aggregator: Arc<Aggregator>,
    state: Arc<Mutex<RegistryState>>,
    poll_interval: Duration,
) -> BroadcastHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let task = tokio::spawn(async move {
        info!("Broadcast loop for {} started", symbol);

        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Broadcast loop for {} stopped", symbol);
                    break;
                }
                _ = ticker.tick() => {
                    broadcast_tick(&symbol, &aggregator, &state).await;
                }
            }
        }
    });

    BroadcastHandle { cancel, task }
}

/// One tick: fetch, snapshot the subscriber set, push.
async fn broadcast_tick(symbol: &str, aggregator: &Aggregator, state: &Mutex<RegistryState>) {
    // The fetch happens without the registry lock held; subscriptions keep
    // mutating freely while a slow provider chain is in flight.
    let quote = match aggregator.get_quote(symbol).await {
        Ok(quote) => quote,
        Err(e) => {
            // A failed tick publishes nothing. The next tick tries again.
            warn!("Broadcast tick for {} failed: {}", symbol, e);
            return;
        }
    };

    let update = PriceUpdate::from(&quote);

    let subscribers = match state.lock() {
        Ok(state) => state.subscribers_of(symbol),
        Err(poisoned) => poisoned.into_inner().subscribers_of(symbol),
    };

    for tx in subscribers {
        // try_send so one stalled viewer cannot hold up the loop. The
        // dropped update is superseded by the next tick anyway.
        if let Err(e) = tx.try_send(update.clone()) {
            debug!("Dropping {} update for a viewer: {}", symbol, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::MarketDataConfig;

    #[tokio::test]
    async fn test_cancel_terminates_task() {
        let aggregator = Arc::new(Aggregator::new(&MarketDataConfig::default(), Vec::new()));
        let state = Arc::new(Mutex::new(RegistryState::new()));

        let handle = spawn_broadcast_loop(
            "AAPL".to_string(),
            aggregator,
            state,
            Duration::from_millis(10),
        );

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!handle.is_finished());

        handle.cancel();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(handle.is_finished());
    }
}
