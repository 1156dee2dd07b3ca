//! Messages exchanged with the reasoning collaborator.
//!
//! The scheduler and dispatcher never await the collaborator. They push a
//! [`CollaboratorRequest`] onto the context's outbox; the run loop executes
//! it on a spawned task and sends the [`CollaboratorResponse`] back over a
//! channel, where it is applied between ticks. Every message carries a
//! [`RequestStamp`] so a response can be matched to the session and the
//! exact request that produced it.

use std::collections::BTreeMap;

use castaway_types::{
    Actor, ActorId, EventKind, Invention, InventionCategory, InventionEffect, PendingTrade,
    Resource, Season, SimulationEpoch, TradeDecisionKind, TradeId, TradeOffer, TradeTerms,
    WorldObject,
};
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;

/// Identifies one outstanding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestStamp {
    /// Session the request was issued in.
    pub epoch: SimulationEpoch,
    /// Per-session sequence number.
    pub ticket: u64,
    /// The actor the request concerns.
    pub actor: ActorId,
}

// ---------------------------------------------------------------------------
// Goal decisions
// ---------------------------------------------------------------------------

/// Everything the collaborator sees when choosing a goal.
#[derive(Debug, Clone, Serialize)]
pub struct GoalRequest {
    /// Request identity.
    pub stamp: RequestStamp,
    /// The deciding actor.
    pub actor: Actor,
    /// The other castaway, if any.
    pub peer: Option<Actor>,
    /// Every placed world object.
    pub objects: Vec<WorldObject>,
    /// Every discovered invention.
    pub inventions: Vec<Invention>,
    /// "Day N, HH:00".
    pub time_label: String,
    /// Current season.
    pub season: Season,
    /// Active configuration.
    pub config: SimulationConfig,
}

impl GoalRequest {
    /// The actor's accept-and-gather commitment, if any.
    pub const fn pending_trade(&self) -> Option<&PendingTrade> {
        self.actor.pending_trade.as_ref()
    }

    /// Whether the actor's vitals are below a critical threshold.
    pub fn is_critical(&self) -> bool {
        castaway_agents::vitals::critical(&self.actor.vitals, &self.config.vitals).is_some()
    }

    /// Inventions the actor has not built yet.
    pub fn available_inventions(&self) -> impl Iterator<Item = &Invention> {
        self.inventions
            .iter()
            .filter(|i| !self.actor.inventions.contains(&i.id))
    }
}

/// The collaborator's answer to a [`GoalRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalDecision {
    /// High-level goal.
    pub goal: String,
    /// Why this goal was chosen.
    pub reasoning: String,
    /// Ordered plan steps; the first runs next.
    pub plan: Vec<EventKind>,
    /// First-person note for short-term memory.
    pub memory_entry: Option<String>,
}

// ---------------------------------------------------------------------------
// Trade decisions
// ---------------------------------------------------------------------------

/// Everything the collaborator sees when answering an offer.
#[derive(Debug, Clone, Serialize)]
pub struct TradeRequest {
    /// Request identity; `stamp.actor` is the decision-maker.
    pub stamp: RequestStamp,
    /// The negotiation.
    pub trade: TradeId,
    /// The offer awaiting an answer.
    pub offer: TradeOffer,
    /// The actor answering.
    pub decider: Actor,
    /// The actor who made the offer.
    pub counterpart: Actor,
    /// Active configuration.
    pub config: SimulationConfig,
}

impl TradeRequest {
    /// Whether the decider holds what the offer asks of them.
    pub fn decider_can_pay(&self) -> bool {
        castaway_agents::can_pay(
            &self.decider,
            self.offer.terms.take,
            self.offer.terms.take_amount,
        )
    }
}

/// The collaborator's answer to a [`TradeRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeDecision {
    /// Accept, reject, counter, or accept-and-gather.
    pub decision: TradeDecisionKind,
    /// Stated reasoning.
    pub reasoning: String,
    /// New terms from the decider's perspective when countering.
    pub counter_offer: Option<TradeTerms>,
}

// ---------------------------------------------------------------------------
// Inventions
// ---------------------------------------------------------------------------

/// A request to flesh out an invention idea.
#[derive(Debug, Clone, Serialize)]
pub struct InventionRequest {
    /// Request identity; `stamp.actor` had the idea.
    pub stamp: RequestStamp,
    /// The generic concept to flesh out.
    pub category: InventionCategory,
    /// Active configuration.
    pub config: SimulationConfig,
}

/// A fleshed-out invention, before it has an identity or icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventionSpec {
    /// Display name.
    pub name: String,
    /// Flavour text.
    pub description: String,
    /// Resources debited on completion.
    pub cost: BTreeMap<Resource, u32>,
    /// Gameplay effect.
    pub effect: InventionEffect,
}

/// A finished invention idea ready to be registered.
#[derive(Debug, Clone, PartialEq)]
pub struct InventionDraft {
    /// The specification.
    pub spec: InventionSpec,
    /// SVG path markup.
    pub icon: String,
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// A request awaiting execution by the run loop.
#[derive(Debug, Clone)]
pub enum CollaboratorRequest {
    /// Choose a goal and plan.
    Goal(Box<GoalRequest>),
    /// Answer a trade offer.
    Trade(Box<TradeRequest>),
    /// Specify an invention and draw its icon.
    Invention(Box<InventionRequest>),
}

impl CollaboratorRequest {
    /// The request's identity.
    pub fn stamp(&self) -> RequestStamp {
        match self {
            Self::Goal(r) => r.stamp,
            Self::Trade(r) => r.stamp,
            Self::Invention(r) => r.stamp,
        }
    }

    /// Short name for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Goal(_) => "goal",
            Self::Trade(_) => "trade",
            Self::Invention(_) => "invention",
        }
    }
}

/// A completed request, ready to be applied.
#[derive(Debug, Clone)]
pub enum CollaboratorResponse {
    /// A goal decision (possibly a fallback).
    Goal {
        /// The originating request.
        stamp: RequestStamp,
        /// The decision.
        decision: GoalDecision,
    },
    /// A trade decision (possibly a fallback).
    Trade {
        /// The originating request.
        stamp: RequestStamp,
        /// The negotiation.
        trade: TradeId,
        /// The offer that was answered.
        offer: TradeOffer,
        /// The decision.
        decision: TradeDecision,
    },
    /// An invention idea; `None` when specification failed.
    Invention {
        /// The originating request.
        stamp: RequestStamp,
        /// The generic concept.
        category: InventionCategory,
        /// The finished idea.
        draft: Option<Box<InventionDraft>>,
    },
}

impl CollaboratorResponse {
    /// The originating request's identity.
    pub const fn stamp(&self) -> RequestStamp {
        match self {
            Self::Goal { stamp, .. } | Self::Trade { stamp, .. } | Self::Invention { stamp, .. } => {
                *stamp
            }
        }
    }
}
