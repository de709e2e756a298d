//! Streaming price distribution.
//!
//! This module contains:
//! - [`SubscriptionRegistry`]: viewer connections and per-symbol
//!   subscriber sets
//! - The per-symbol broadcast loop that polls through the aggregator and
//!   fans updates out to subscriber channels
//!
//! Updates are pushed over bounded mpsc channels. A slow viewer loses
//! updates rather than slowing the loop; every update is superseded by the
//! next tick, so dropped ones cost nothing.

mod broadcast;
mod registry;

pub use registry::{SubscriptionRegistry, VIEWER_CHANNEL_CAPACITY};
