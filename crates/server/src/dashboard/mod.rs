//! Live feed: per-call metrics and world changes.
//!
//! Design contract with the request path:
//!   • Metrics: atomic fetch_add, zero-alloc, never blocks.
//!   • World changes: published via `tokio::sync::broadcast` (non-blocking
//!     send; a slow subscriber lags and skips, never stalling a call).
//!   • The WebSocket tasks never touch the world or ledger directly.

pub mod metrics;
pub mod server;

use tokio::sync::broadcast;

use crate::event_bus::WorldChangeBatch;

pub use metrics::{Call, Metrics};

/// Shared between the API handlers and the live-feed sockets.
pub struct DashboardState {
    pub metrics: Metrics,
    bus_tx: broadcast::Sender<WorldChangeBatch>,
}

impl DashboardState {
    pub fn new(bus_tx: broadcast::Sender<WorldChangeBatch>) -> Self {
        Self {
            metrics: Metrics::new(),
            bus_tx,
        }
    }

    /// Publish a batch of changes. Best-effort: with no subscribers the
    /// batch is simply dropped.
    pub fn publish(&self, batch: WorldChangeBatch) {
        let _ = self.bus_tx.send(batch);
    }

    /// Create a new receiver for world changes (one per WebSocket client).
    pub fn subscribe_changes(&self) -> broadcast::Receiver<WorldChangeBatch> {
        self.bus_tx.subscribe()
    }
}
