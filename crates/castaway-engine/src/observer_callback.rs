//! Tick callback that feeds the Observer API.
//!
//! After each tick the callback broadcasts a [`TickBroadcast`] to
//! `WebSocket` clients and replaces the [`SimulationSnapshot`] the REST
//! routes serve. Out-of-tick changes (a reset, late collaborator answers
//! while stopped) only refresh the snapshot.

use std::sync::Arc;

use castaway_core::{SimulationContext, TickCallback, TickSummary};
use castaway_observer::{AppState, SimulationSnapshot, TickBroadcast};
use tracing::debug;

/// Bridges the run loop to the Observer API.
pub struct ObserverCallback {
    state: Arc<AppState>,
}

impl ObserverCallback {
    /// Create a callback publishing into `state`.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    fn publish(&self, ctx: &SimulationContext) {
        // try_write keeps the loop from blocking behind a slow reader.
        if !self.state.try_publish(SimulationSnapshot::capture(ctx)) {
            debug!(tick = ctx.clock.tick(), "Snapshot busy, skipping update");
        }
    }
}

impl TickCallback for ObserverCallback {
    fn on_tick(&mut self, summary: &TickSummary, ctx: &SimulationContext) {
        let receivers = self
            .state
            .broadcast(&TickBroadcast::from_summary(summary, ctx.epoch));
        debug!(tick = summary.tick, receivers, "Tick broadcast sent");
        self.publish(ctx);
    }

    fn on_refresh(&mut self, ctx: &SimulationContext) {
        self.publish(ctx);
    }
}
