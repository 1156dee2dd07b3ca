//! The simulation context: every piece of mutable state for one session.
//!
//! A [`SimulationContext`] is created on session start, rebuilt on reset,
//! and passed by reference into the scheduler, dispatcher and negotiation
//! protocol. Nothing in the core holds global state.
//!
//! Collaborator requests are never executed here. They are staged in an
//! outbox, stamped with the session epoch and a ticket, and drained by the
//! run loop after each tick. The context remembers which goal ticket is
//! outstanding per actor and which actors have a discovery in flight, so a
//! response can be matched to the exact request that produced it.

use std::collections::{BTreeMap, BTreeSet};

use castaway_agents::{InventionEffects, memory, starting_cast};
use castaway_types::{
    Actor, ActorId, Invention, InventionCategory, InventionId, LogKind, SimulationEpoch, Trade,
    TradeId, TradeOffer,
};
use castaway_world::{Island, ObjectRegistry, WorldError, populate};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::clock::WorldClock;
use crate::collaborator::{
    CollaboratorRequest, GoalRequest, InventionRequest, RequestStamp, TradeRequest,
};
use crate::config::SimulationConfig;
use crate::log::EventLog;
use crate::queue::EventQueue;

/// Errors that can occur while building a session.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// Island generation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The island has no land to place the cast on.
    #[error("no land tile available to place {name}")]
    NoLand {
        /// The actor that could not be placed.
        name: String,
    },
}

/// All mutable state of one simulation session.
#[derive(Debug)]
pub struct SimulationContext {
    /// Session token; regenerated on every reset.
    pub epoch: SimulationEpoch,
    /// Active configuration.
    pub config: SimulationConfig,
    /// Simulated time.
    pub clock: WorldClock,
    /// Traversability grid.
    pub island: Island,
    /// Placed objects.
    pub objects: ObjectRegistry,
    /// Actors by id.
    pub actors: BTreeMap<ActorId, Actor>,
    /// Pending intents.
    pub queue: EventQueue,
    /// Every negotiation this session, including finished ones.
    pub trades: BTreeMap<TradeId, Trade>,
    /// Discovered inventions.
    pub inventions: BTreeMap<InventionId, Invention>,
    /// User-visible event log.
    pub log: EventLog,
    pub(crate) rng: StdRng,
    outbox: Vec<CollaboratorRequest>,
    next_ticket: u64,
    goal_tickets: BTreeMap<ActorId, u64>,
    discovering: BTreeSet<ActorId>,
}

impl SimulationContext {
    /// Start a new session: generate the island, place objects, and put the
    /// starting cast on random free land.
    ///
    /// The RNG is seeded from `config.simulation.seed` when set.
    pub fn new(config: SimulationConfig) -> Result<Self, ContextError> {
        let seed = config.simulation.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);

        let island = Island::generate(
            config.map.width,
            config.map.height,
            config.map.land_ratio,
            &mut rng,
        )?;
        let objects = populate(&island, config.world.starting_objects(), &mut rng);

        let mut occupied = objects.occupied();
        let mut actors = Vec::new();
        for member in starting_cast() {
            let position = island
                .find_random_land_position(&occupied, &mut rng)
                .or_else(|| island.land_tiles().next())
                .ok_or_else(|| ContextError::NoLand {
                    name: member.name.to_owned(),
                })?;
            occupied.insert(position);
            actors.push(member.spawn(position));
        }

        let context = Self::from_parts(config, island, objects, actors, rng);
        info!(
            epoch = %context.epoch,
            seed,
            actors = context.actors.len(),
            objects = context.objects.len(),
            land_tiles = context.island.land_count(),
            "Simulation session created"
        );
        Ok(context)
    }

    /// Assemble a session from prepared parts.
    pub fn from_parts(
        config: SimulationConfig,
        island: Island,
        objects: ObjectRegistry,
        actors: Vec<Actor>,
        rng: StdRng,
    ) -> Self {
        let log = EventLog::new(config.simulation.log_capacity);
        Self {
            epoch: SimulationEpoch::new(),
            config,
            clock: WorldClock::new(),
            island,
            objects,
            actors: actors.into_iter().map(|a| (a.id, a)).collect(),
            queue: EventQueue::new(),
            trades: BTreeMap::new(),
            inventions: BTreeMap::new(),
            log,
            rng,
            outbox: Vec::new(),
            next_ticket: 0,
            goal_tickets: BTreeMap::new(),
            discovering: BTreeSet::new(),
        }
    }

    /// Rebuild every piece of state under a fresh epoch.
    ///
    /// Requests still in flight carry the old epoch and will be discarded.
    pub fn reset(&mut self, config: SimulationConfig) -> Result<(), ContextError> {
        let previous = self.epoch;
        *self = Self::new(config)?;
        info!(previous = %previous, epoch = %self.epoch, "Simulation reset");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers shared by the scheduler, dispatcher and negotiation protocol
    // -----------------------------------------------------------------------

    /// Append to the event log at the current time.
    pub fn note(&mut self, kind: LogKind, actor: Option<ActorId>, message: impl Into<String>) {
        self.log.push(&self.clock, kind, actor, message);
    }

    /// Display name of `id`, or "Someone" when the actor is gone.
    pub fn name_of(&self, id: ActorId) -> String {
        self.actors
            .get(&id)
            .map_or_else(|| String::from("Someone"), |a| a.name.clone())
    }

    /// Add a short-term memory note to `id`.
    pub fn remember(&mut self, id: ActorId, note: impl Into<String>) {
        let capacity = self.config.simulation.short_term_memory;
        if let Some(actor) = self.actors.get_mut(&id) {
            memory::remember(actor, note, capacity);
        }
    }

    /// Short-term memory length from configuration.
    pub const fn memory_capacity(&self) -> usize {
        self.config.simulation.short_term_memory
    }

    /// The combined invention effects `actor` enjoys.
    pub fn effects_for(&self, actor: &Actor) -> InventionEffects {
        InventionEffects::for_actor(actor, &self.inventions)
    }

    /// Any actor other than `id`.
    pub fn peer_of(&self, id: ActorId) -> Option<&Actor> {
        self.actors.values().find(|a| a.id != id)
    }

    // -----------------------------------------------------------------------
    // Collaborator requests
    // -----------------------------------------------------------------------

    fn stamp(&mut self, actor: ActorId) -> RequestStamp {
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.saturating_add(1);
        RequestStamp {
            epoch: self.epoch,
            ticket,
            actor,
        }
    }

    /// Stage a goal request for `id`, superseding any outstanding one.
    ///
    /// Returns `false` when the actor does not exist.
    pub fn request_goal(&mut self, id: ActorId) -> bool {
        let Some(actor) = self.actors.get(&id).cloned() else {
            return false;
        };
        let stamp = self.stamp(id);
        if let Some(previous) = self.goal_tickets.insert(id, stamp.ticket) {
            debug!(actor = %id, previous, ticket = stamp.ticket, "goal request superseded");
        }
        let request = GoalRequest {
            stamp,
            peer: self.peer_of(id).cloned(),
            objects: self.objects.iter().cloned().collect(),
            inventions: self.inventions.values().cloned().collect(),
            time_label: self.clock.label(),
            season: self.clock.season(),
            config: self.config.clone(),
            actor,
        };
        self.outbox.push(CollaboratorRequest::Goal(Box::new(request)));
        true
    }

    /// Stage a trade decision for `decider` on `offer`.
    pub fn request_trade(&mut self, trade: TradeId, offer: TradeOffer, decider: ActorId) -> bool {
        let (Some(decider_actor), Some(counterpart)) = (
            self.actors.get(&decider).cloned(),
            self.actors.get(&offer.from).cloned(),
        ) else {
            return false;
        };
        let request = TradeRequest {
            stamp: self.stamp(decider),
            trade,
            offer,
            decider: decider_actor,
            counterpart,
            config: self.config.clone(),
        };
        self.outbox.push(CollaboratorRequest::Trade(Box::new(request)));
        true
    }

    /// Stage an invention idea for `id` unless one is already in flight.
    pub fn request_invention(&mut self, id: ActorId, category: InventionCategory) -> bool {
        if !self.discovering.insert(id) {
            return false;
        }
        let request = InventionRequest {
            stamp: self.stamp(id),
            category,
            config: self.config.clone(),
        };
        self.outbox.push(CollaboratorRequest::Invention(Box::new(request)));
        true
    }

    /// Take every staged request.
    pub fn drain_requests(&mut self) -> Vec<CollaboratorRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Number of staged requests.
    pub fn pending_requests(&self) -> usize {
        self.outbox.len()
    }

    /// Whether `id` has a goal request in flight.
    pub fn goal_outstanding(&self, id: ActorId) -> bool {
        self.goal_tickets.contains_key(&id)
    }

    /// Cancel `id`'s outstanding goal request; its answer becomes stale.
    pub fn cancel_goal(&mut self, id: ActorId) {
        if let Some(ticket) = self.goal_tickets.remove(&id) {
            debug!(actor = %id, ticket, "goal request cancelled");
        }
    }

    /// Consume the outstanding goal ticket if it matches `stamp`.
    pub(crate) fn claim_goal(&mut self, stamp: RequestStamp) -> bool {
        if self.goal_tickets.get(&stamp.actor) == Some(&stamp.ticket) {
            self.goal_tickets.remove(&stamp.actor);
            true
        } else {
            false
        }
    }

    /// Whether `id` has an invention idea in flight.
    pub fn is_discovering(&self, id: ActorId) -> bool {
        self.discovering.contains(&id)
    }

    /// Release `id`'s discovery guard.
    pub(crate) fn finish_discovery(&mut self, id: ActorId) -> bool {
        self.discovering.remove(&id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use castaway_types::{Position, Vitals};

    use super::*;

    /// A 10x10 all-land session with Robinson at (1,1) and Friday at (5,5).
    pub(crate) fn small_context() -> SimulationContext {
        let mut config = SimulationConfig::default();
        config.map.width = 10;
        config.map.height = 10;
        config.world.invention_chance = 0.0;
        let island = Island::all_land(10, 10).unwrap();
        let vitals = Vitals {
            energy: 100.0,
            hunger: 100.0,
        };
        let robinson = Actor::new("Robinson", Position::new(1, 1), vitals);
        let friday = Actor::new("Friday", Position::new(5, 5), vitals);
        SimulationContext::from_parts(
            config,
            island,
            ObjectRegistry::new(),
            vec![robinson, friday],
            StdRng::seed_from_u64(42),
        )
    }

    /// Look up an actor id by name.
    pub(crate) fn id_of(ctx: &SimulationContext, name: &str) -> ActorId {
        ctx.actors.values().find(|a| a.name == name).unwrap().id
    }

    #[test]
    fn new_session_places_cast_on_free_land() {
        let mut config = SimulationConfig::default();
        config.simulation.seed = Some(3);
        let ctx = SimulationContext::new(config).unwrap();
        assert_eq!(ctx.actors.len(), 2);
        for actor in ctx.actors.values() {
            assert!(ctx.island.is_land(actor.position));
            assert!(!ctx.objects.is_occupied(actor.position));
        }
        assert_eq!(ctx.objects.len(), 10);
    }

    #[test]
    fn reset_changes_epoch_and_clears_state() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        ctx.request_goal(robinson);
        ctx.note(LogKind::Info, None, "before reset");
        let before = ctx.epoch;

        let mut config = SimulationConfig::default();
        config.simulation.seed = Some(1);
        ctx.reset(config).unwrap();

        assert_ne!(ctx.epoch, before);
        assert!(ctx.log.is_empty());
        assert_eq!(ctx.pending_requests(), 0);
        assert_eq!(ctx.clock.tick(), 0);
    }

    #[test]
    fn newer_goal_request_supersedes_older() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        assert!(ctx.request_goal(robinson));
        assert!(ctx.request_goal(robinson));
        let stamps: Vec<_> = ctx.drain_requests().iter().map(CollaboratorRequest::stamp).collect();
        let (first, second) = (stamps.first().copied().unwrap(), stamps.get(1).copied().unwrap());
        assert!(!ctx.claim_goal(first));
        assert!(ctx.claim_goal(second));
        assert!(!ctx.goal_outstanding(robinson));
    }

    #[test]
    fn one_discovery_in_flight_per_actor() {
        let mut ctx = small_context();
        let friday = id_of(&ctx, "Friday");
        assert!(ctx.request_invention(friday, InventionCategory::FoodPreservation));
        assert!(!ctx.request_invention(friday, InventionCategory::ToolImprovement));
        assert!(ctx.is_discovering(friday));
        assert!(ctx.finish_discovery(friday));
        assert!(ctx.request_invention(friday, InventionCategory::ToolImprovement));
    }
}
