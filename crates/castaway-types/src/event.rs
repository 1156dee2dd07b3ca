//! Queued intents and the trade terms they carry.
//!
//! An [`Event`] is one intent for one actor. Events live in the simulation's
//! event queue until the dispatcher pops them, and the same [`EventKind`]
//! values make up an actor's plan queue (the actor is implied there).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Resource, TradeDecisionKind};
use crate::ids::{ActorId, InventionId, ObjectId, TradeId};
use crate::structs::Position;

/// One pending intent owned by an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// The actor this event acts on.
    pub actor: ActorId,
    /// What the actor intends to do.
    pub kind: EventKind,
}

impl Event {
    /// Build an event for `actor`.
    pub const fn new(actor: ActorId, kind: EventKind) -> Self {
        Self { actor, kind }
    }

    /// A decide-goal event for `actor`.
    pub const fn decide(actor: ActorId) -> Self {
        Self::new(actor, EventKind::DecideGoal)
    }

    /// Whether this is a decide-goal event.
    pub const fn is_decide(&self) -> bool {
        matches!(self.kind, EventKind::DecideGoal)
    }
}

/// The type of an intent plus the structured data it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// Ask the reasoning collaborator for a new goal and plan.
    DecideGoal,
    /// Do nothing for this plan step.
    Idle,
    /// Walk to `destination`, then run `then` (if any) on arrival.
    Move {
        /// Grid cell to walk to.
        destination: Position,
        /// Deferred follow-up queued at the front on arrival.
        then: Option<Box<Event>>,
    },
    /// Gather `resource` from a source object.
    Gather {
        /// What to gather.
        resource: Resource,
        /// The source object; resolved from the nearest match when absent.
        source: Option<ObjectId>,
        /// Total to collect before the plan step counts as done.
        target_amount: Option<u32>,
        /// Collected so far across repeated gather cycles.
        #[serde(default)]
        gathered: u32,
    },
    /// Sleep to restore energy.
    Sleep,
    /// Eat one unit of `resource`.
    Consume {
        /// The food to eat.
        resource: Resource,
    },
    /// Craft an axe from wood and stone.
    CraftAxe,
    /// Build a shelter on a clear adjacent cell.
    BuildShelter,
    /// Build a discovered invention.
    BuildInvention {
        /// The invention to build.
        invention: InventionId,
    },
    /// Propose a trade to `partner`.
    TradeInitiate {
        /// Who the offer goes to.
        partner: ActorId,
        /// Offered and requested goods.
        terms: TradeTerms,
    },
    /// The event's actor decides on `offer` within trade `trade`.
    TradeNegotiate {
        /// The negotiation this offer belongs to.
        trade: TradeId,
        /// The offer awaiting an answer.
        offer: TradeOffer,
    },
    /// Settle the actor's pending (accept-and-gather) trade.
    TradeFinalize,
}

impl EventKind {
    /// Stable upper-case name, as used in plans and logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DecideGoal => "DECIDE_GOAL",
            Self::Idle => "IDLE",
            Self::Move { .. } => "MOVE",
            Self::Gather { .. } => "GATHER",
            Self::Sleep => "SLEEP",
            Self::Consume { .. } => "CONSUME",
            Self::CraftAxe => "CRAFT_AXE",
            Self::BuildShelter => "BUILD_SHELTER",
            Self::BuildInvention { .. } => "BUILD_INVENTION",
            Self::TradeInitiate { .. } => "TRADE_INITIATE",
            Self::TradeNegotiate { .. } => "TRADE_NEGOTIATE",
            Self::TradeFinalize => "TRADE_FINALIZE",
        }
    }
}

/// What one side gives and what it asks for in return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TradeTerms {
    /// Resource the offering side hands over.
    pub give: Resource,
    /// Quantity handed over.
    pub give_amount: u32,
    /// Resource the offering side wants.
    pub take: Resource,
    /// Quantity wanted.
    pub take_amount: u32,
}

impl TradeTerms {
    /// The same exchange seen from the other side.
    pub const fn swapped(self) -> Self {
        Self {
            give: self.take,
            give_amount: self.take_amount,
            take: self.give,
            take_amount: self.give_amount,
        }
    }
}

impl core::fmt::Display for TradeTerms {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} {} for {} {}",
            self.give_amount, self.give, self.take_amount, self.take
        )
    }
}

/// One round of a negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TradeOffer {
    /// The actor making this offer (giver of `terms.give`).
    pub from: ActorId,
    /// The actor who must answer.
    pub to: ActorId,
    /// Offered and requested goods, from `from`'s perspective.
    pub terms: TradeTerms,
    /// One-based negotiation turn.
    pub turn: u32,
    /// The answer, once given.
    pub decision: Option<TradeDecisionKind>,
    /// The answer's stated reasoning, once given.
    pub reasoning: Option<String>,
}

impl TradeOffer {
    /// A fresh, unanswered offer.
    pub const fn new(from: ActorId, to: ActorId, terms: TradeTerms, turn: u32) -> Self {
        Self {
            from,
            to,
            terms,
            turn,
            decision: None,
            reasoning: None,
        }
    }
}
