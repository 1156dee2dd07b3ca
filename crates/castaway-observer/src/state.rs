//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the broadcast channel for tick summaries and an
//! in-memory copy of the session that the REST endpoints serve. The engine
//! replaces the copy after every tick and after out-of-tick changes such
//! as a reset.

use std::collections::BTreeMap;
use std::sync::Arc;

use castaway_core::clock::WorldClock;
use castaway_core::operator::OperatorState;
use castaway_core::tick::{CompletedAction, TickSummary};
use castaway_core::SimulationContext;
use castaway_types::{
    Actor, ActorId, Event, Invention, InventionId, LogEntry, Season, SimulationEpoch, Trade,
    TradeId, WorldObject,
};
use castaway_world::Island;
use tokio::sync::{RwLock, broadcast};

/// Capacity of the broadcast channel for tick summaries.
///
/// A subscriber that falls further behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest message.
const BROADCAST_CAPACITY: usize = 256;

/// JSON tick summary pushed over the `WebSocket`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TickBroadcast {
    /// Session the tick belongs to.
    pub epoch: SimulationEpoch,
    /// The tick number.
    pub tick: u64,
    /// "Day N, HH:00".
    pub time_label: String,
    /// Current season.
    pub season: Season,
    /// Actors interrupted by critical vitals.
    pub interrupted: Vec<ActorId>,
    /// Actions that finished this tick.
    pub completed: Vec<CompletedAction>,
    /// Queue heads the dispatcher handled.
    pub events_handled: u32,
    /// Shelters lost to catastrophes.
    pub shelters_destroyed: usize,
    /// Trees that grew back.
    pub trees_grown: usize,
    /// Events left in the queue.
    pub queue_len: usize,
    /// Collaborator requests issued after the tick.
    pub requests: usize,
}

impl TickBroadcast {
    /// Project a core tick summary for the wire.
    pub fn from_summary(summary: &TickSummary, epoch: SimulationEpoch) -> Self {
        Self {
            epoch,
            tick: summary.tick,
            time_label: summary.time_label.clone(),
            season: summary.season,
            interrupted: summary.interrupted.clone(),
            completed: summary.completed.clone(),
            events_handled: summary.events_handled,
            shelters_destroyed: summary.shelters_destroyed,
            trees_grown: summary.trees_grown,
            queue_len: summary.queue_len,
            requests: summary.requests,
        }
    }
}

/// In-memory copy of the session served by REST endpoints.
#[derive(Debug, Clone)]
pub struct SimulationSnapshot {
    /// Session token, once a session has been captured.
    pub epoch: Option<SimulationEpoch>,
    /// Current tick number.
    pub tick: u64,
    /// "Day N, HH:00".
    pub time_label: String,
    /// Current season.
    pub season: Season,
    /// The traversability grid.
    pub island: Option<Island>,
    /// Actors keyed by id.
    pub actors: BTreeMap<ActorId, Actor>,
    /// Placed world objects.
    pub objects: Vec<WorldObject>,
    /// Every negotiation this session.
    pub trades: BTreeMap<TradeId, Trade>,
    /// Discovered inventions.
    pub inventions: BTreeMap<InventionId, Invention>,
    /// User-visible log, oldest first.
    pub log: Vec<LogEntry>,
    /// Pending event queue, head first.
    pub queue: Vec<Event>,
}

impl SimulationSnapshot {
    /// Copy everything the API serves out of a live session.
    pub fn capture(ctx: &SimulationContext) -> Self {
        Self {
            epoch: Some(ctx.epoch),
            tick: ctx.clock.tick(),
            time_label: ctx.clock.label(),
            season: ctx.clock.season(),
            island: Some(ctx.island.clone()),
            actors: ctx.actors.clone(),
            objects: ctx.objects.iter().cloned().collect(),
            trades: ctx.trades.clone(),
            inventions: ctx.inventions.clone(),
            log: ctx.log.entries().cloned().collect(),
            queue: ctx.queue.iter().cloned().collect(),
        }
    }
}

impl Default for SimulationSnapshot {
    fn default() -> Self {
        let clock = WorldClock::new();
        Self {
            epoch: None,
            tick: 0,
            time_label: clock.label(),
            season: clock.season(),
            island: None,
            actors: BTreeMap::new(),
            objects: Vec::new(),
            trades: BTreeMap::new(),
            inventions: BTreeMap::new(),
            log: Vec::new(),
            queue: Vec::new(),
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for tick summaries.
    pub tx: broadcast::Sender<TickBroadcast>,
    /// The latest session copy.
    pub snapshot: Arc<RwLock<SimulationSnapshot>>,
    /// Operator control state (present when a run loop is attached).
    pub operator_state: Option<Arc<OperatorState>>,
}

impl AppState {
    /// Create application state with an empty snapshot and no run loop.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            snapshot: Arc::new(RwLock::new(SimulationSnapshot::default())),
            operator_state: None,
        }
    }

    /// Create application state attached to a run loop's operator state.
    pub fn with_operator(operator: Arc<OperatorState>) -> Self {
        Self {
            operator_state: Some(operator),
            ..Self::new()
        }
    }

    /// Subscribe to the tick broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<TickBroadcast> {
        self.tx.subscribe()
    }

    /// Publish a tick summary to all connected clients.
    ///
    /// Returns the number of receivers; 0 when nobody is connected.
    pub fn broadcast(&self, summary: &TickBroadcast) -> usize {
        self.tx.send(summary.clone()).unwrap_or(0)
    }

    /// Replace the snapshot without waiting.
    ///
    /// Returns `false` when a reader holds the lock; the next publish
    /// catches up.
    pub fn try_publish(&self, snapshot: SimulationSnapshot) -> bool {
        self.snapshot.try_write().is_ok_and(|mut guard| {
            *guard = snapshot;
            true
        })
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use castaway_core::SimulationConfig;

    use super::*;

    fn context() -> SimulationContext {
        let mut config = SimulationConfig::default();
        config.simulation.seed = Some(11);
        SimulationContext::new(config).unwrap()
    }

    #[test]
    fn capture_copies_the_session() {
        let ctx = context();
        let snapshot = SimulationSnapshot::capture(&ctx);
        assert_eq!(snapshot.epoch, Some(ctx.epoch));
        assert_eq!(snapshot.actors.len(), ctx.actors.len());
        assert_eq!(snapshot.objects.len(), ctx.objects.len());
        assert_eq!(snapshot.time_label, ctx.clock.label());
        assert!(snapshot.island.is_some());
    }

    #[tokio::test]
    async fn try_publish_replaces_the_snapshot() {
        let state = AppState::new();
        let ctx = context();
        assert!(state.try_publish(SimulationSnapshot::capture(&ctx)));
        assert_eq!(state.snapshot.read().await.epoch, Some(ctx.epoch));
    }

    #[tokio::test]
    async fn try_publish_skips_while_read_locked() {
        let state = AppState::new();
        let guard = state.snapshot.read().await;
        assert!(!state.try_publish(SimulationSnapshot::capture(&context())));
        drop(guard);
        assert!(state.snapshot.read().await.epoch.is_none());
    }

    #[test]
    fn broadcast_without_receivers_is_zero() {
        let state = AppState::new();
        let summary = TickBroadcast {
            epoch: SimulationEpoch::new(),
            tick: 1,
            time_label: String::from("Day 1, 01:00"),
            season: Season::Spring,
            interrupted: Vec::new(),
            completed: Vec::new(),
            events_handled: 0,
            shelters_destroyed: 0,
            trees_grown: 0,
            queue_len: 0,
            requests: 0,
        };
        assert_eq!(state.broadcast(&summary), 0);
        let mut rx = state.subscribe();
        assert_eq!(state.broadcast(&summary), 1);
        assert_eq!(rx.try_recv().unwrap().tick, 1);
    }
}
