//! Core entity records: actors, world objects, trades, inventions, log entries.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::action::ActionState;
use crate::enums::{
    HousingStatus, InventionCategory, LogKind, ObjectKind, Resource, ToolStatus, TradeStatus,
    VitalStat,
};
use crate::event::{EventKind, TradeOffer, TradeTerms};
use crate::ids::{ActorId, InventionId, ObjectId, TradeId};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A cell on the island grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Column, zero at the west edge.
    pub x: u32,
    /// Row, zero at the north edge.
    pub y: u32,
}

impl Position {
    /// Build a position.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`, in cells.
    pub fn distance_to(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }

    /// The four orthogonal neighbours in north, east, south, west order.
    ///
    /// Neighbours that would fall below zero are `None`; the upper bound is
    /// the caller's grid size.
    pub fn neighbours(self) -> [Option<Self>; 4] {
        [
            self.y.checked_sub(1).map(|y| Self::new(self.x, y)),
            self.x.checked_add(1).map(|x| Self::new(x, self.y)),
            self.y.checked_add(1).map(|y| Self::new(self.x, y)),
            self.x.checked_sub(1).map(|x| Self::new(x, self.y)),
        ]
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// Energy and hunger, each bounded to `[0, max]`.
///
/// Hunger is satiety: it falls over time and a low value means starving.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vitals {
    /// Stamina; restored by sleep.
    pub energy: f64,
    /// Satiety; restored by eating.
    pub hunger: f64,
}

impl Vitals {
    /// Read one stat.
    pub const fn get(&self, stat: VitalStat) -> f64 {
        match stat {
            VitalStat::Hunger => self.hunger,
            VitalStat::Energy => self.energy,
        }
    }
}

/// The outcome of an actor's most recent trade, as remembered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LastTrade {
    /// The counterpart.
    pub partner: ActorId,
    /// Terminal status the trade reached.
    pub outcome: TradeStatus,
    /// Summary of the goods involved.
    pub details: String,
}

/// Durable facts an actor keeps about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LongTermMemory {
    /// Whether the actor owns a shelter.
    pub housing: HousingStatus,
    /// Whether the actor carries a working axe.
    pub tools: ToolStatus,
    /// The last finished trade, if any.
    pub last_trade: Option<LastTrade>,
}

impl Default for LongTermMemory {
    fn default() -> Self {
        Self {
            housing: HousingStatus::Unhoused,
            tools: ToolStatus::NoTools,
            last_trade: None,
        }
    }
}

/// A committed accept-and-gather trade the holder must still settle.
///
/// Terms are from the holder's perspective: `terms.give` is what the holder
/// still has to gather and hand over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PendingTrade {
    /// The negotiation that produced the commitment.
    pub trade: TradeId,
    /// The actor waiting to be paid.
    pub partner: ActorId,
    /// What the holder gives and receives.
    pub terms: TradeTerms,
}

/// A castaway's full mutable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Actor {
    /// Identity.
    pub id: ActorId,
    /// Display name.
    pub name: String,
    /// Current grid cell.
    pub position: Position,
    /// Energy and hunger.
    pub vitals: Vitals,
    /// Held resources; zero entries are removed.
    pub inventory: BTreeMap<Resource, u32>,
    /// Equipped tools and their durability (0 to 100).
    pub tools: BTreeMap<Resource, u32>,
    /// Per-resource gathering speed multipliers (1.0 when absent).
    pub productivity: BTreeMap<Resource, f64>,
    /// The action in progress.
    pub action: ActionState,
    /// Ticks spent in the current action.
    pub action_progress: u32,
    /// Remaining plan steps; the head is executed next.
    #[ts(as = "Vec<EventKind>")]
    pub plan: VecDeque<EventKind>,
    /// Free-text goal set by the last decision.
    pub goal: String,
    /// Recent notes, most recent first.
    #[ts(as = "Vec<String>")]
    pub short_term_memory: VecDeque<String>,
    /// Durable facts.
    pub long_term_memory: LongTermMemory,
    /// Inventions this actor has built.
    pub inventions: BTreeSet<InventionId>,
    /// Ticks until the actor may trade again.
    pub trade_cooldown: u32,
    /// Accept-and-gather commitment awaiting settlement.
    pub pending_trade: Option<PendingTrade>,
    /// Label of the last action that ran to completion.
    pub last_completed_action: Option<String>,
}

impl Actor {
    /// Create an idle actor with empty inventory at `position`.
    pub fn new(name: impl Into<String>, position: Position, vitals: Vitals) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
            position,
            vitals,
            inventory: BTreeMap::new(),
            tools: BTreeMap::new(),
            productivity: BTreeMap::new(),
            action: ActionState::Idle,
            action_progress: 0,
            plan: VecDeque::new(),
            goal: String::from("Idle"),
            short_term_memory: VecDeque::new(),
            long_term_memory: LongTermMemory::default(),
            inventions: BTreeSet::new(),
            trade_cooldown: 0,
            pending_trade: None,
            last_completed_action: None,
        }
    }

    /// Whether the actor is idle.
    pub const fn is_idle(&self) -> bool {
        self.action.is_idle()
    }

    /// Quantity of `resource` held.
    pub fn holding(&self, resource: Resource) -> u32 {
        self.inventory.get(&resource).copied().unwrap_or(0)
    }

    /// Base productivity multiplier for `resource` (1.0 when unset).
    pub fn productivity_for(&self, resource: Resource) -> f64 {
        self.productivity.get(&resource).copied().unwrap_or(1.0)
    }

    /// Whether the actor carries an axe with durability left.
    pub fn has_working_axe(&self) -> bool {
        self.tools.get(&Resource::Axe).is_some_and(|d| *d > 0)
    }
}

// ---------------------------------------------------------------------------
// World objects
// ---------------------------------------------------------------------------

/// A placed object: a resource source or a shelter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldObject {
    /// Identity. For shelters, derived from the owner.
    pub id: ObjectId,
    /// What the object is.
    pub kind: ObjectKind,
    /// Grid cell it occupies.
    pub position: Position,
    /// Owning actor (shelters only).
    pub owner: Option<ActorId>,
    /// Nominal stock the source offers (display only).
    pub stock: BTreeMap<Resource, u32>,
    /// Wood taken so far (trees only).
    pub wood_extracted: u32,
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// A negotiation between two actors, retained after it ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Trade {
    /// Identity.
    pub id: TradeId,
    /// The actor who opened the negotiation.
    pub initiator: ActorId,
    /// The actor first asked to decide.
    pub recipient: ActorId,
    /// Every offer in order, including counter-offers.
    pub history: Vec<TradeOffer>,
    /// Where the negotiation stands.
    pub status: TradeStatus,
    /// Who is expected to answer right now.
    pub decision_maker: Option<ActorId>,
    /// Reasoning attached to the final outcome.
    pub final_reasoning: Option<String>,
}

impl Trade {
    /// Open a trade with its first offer, in the `Moving` state.
    pub fn open(initiator: ActorId, recipient: ActorId, terms: TradeTerms) -> Self {
        Self {
            id: TradeId::new(),
            initiator,
            recipient,
            history: vec![TradeOffer::new(initiator, recipient, terms, 1)],
            status: TradeStatus::Moving,
            decision_maker: None,
            final_reasoning: None,
        }
    }

    /// Move to `next` if the status graph allows it.
    ///
    /// Returns `false` and leaves the status untouched otherwise.
    pub fn transition(&mut self, next: TradeStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    /// The latest offer.
    pub fn latest_offer(&self) -> Option<&TradeOffer> {
        self.history.last()
    }
}

// ---------------------------------------------------------------------------
// Inventions
// ---------------------------------------------------------------------------

/// The single quantitative effect an invention grants its owners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum InventionEffect {
    /// Multiplies gathering productivity for `resource`.
    ProductivityBoost {
        /// Affected resource.
        resource: Resource,
        /// Factor applied (1.2 = 20% faster).
        multiplier: f64,
    },
    /// Multiplies the decay rate of `stat`.
    StatDecayModifier {
        /// Affected stat.
        stat: VitalStat,
        /// Factor applied (0.9 = 10% slower decay).
        multiplier: f64,
    },
    /// Adds a flat amount to every gather of `resource`.
    GatherYieldBonus {
        /// Affected resource.
        resource: Resource,
        /// Extra units per completed gather.
        bonus: u32,
    },
}

/// A discovered invention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Invention {
    /// Identity.
    pub id: InventionId,
    /// Display name.
    pub name: String,
    /// Flavour text.
    pub description: String,
    /// The generic concept it was fleshed out from.
    pub category: InventionCategory,
    /// Resources debited on completion.
    pub cost: BTreeMap<Resource, u32>,
    /// Gameplay effect.
    pub effect: InventionEffect,
    /// SVG path markup for the icon.
    pub icon: String,
    /// Actors who have built it.
    pub owners: BTreeSet<ActorId>,
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

/// One user-visible log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LogEntry {
    /// Monotonic sequence number within the session.
    pub sequence: u64,
    /// Simulation tick the entry was first written.
    pub tick: u64,
    /// "Day N, HH:00".
    pub time_label: String,
    /// The message.
    pub message: String,
    /// Severity category.
    pub kind: LogKind,
    /// The actor the entry concerns, if any.
    pub actor: Option<ActorId>,
    /// How many consecutive times this message was logged.
    pub count: u32,
    /// Wall-clock time of the first occurrence.
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbours_skip_negative_cells() {
        let corner = Position::new(0, 0);
        let [north, east, south, west] = corner.neighbours();
        assert_eq!(north, None);
        assert_eq!(east, Some(Position::new(1, 0)));
        assert_eq!(south, Some(Position::new(0, 1)));
        assert_eq!(west, None);
    }

    #[test]
    fn distance_is_euclidean() {
        let d = Position::new(0, 0).distance_to(Position::new(3, 4));
        assert!((d - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn productivity_defaults_to_one() {
        let actor = Actor::new(
            "Tester",
            Position::new(1, 1),
            Vitals {
                energy: 100.0,
                hunger: 100.0,
            },
        );
        assert!((actor.productivity_for(Resource::Fish) - 1.0).abs() < f64::EPSILON);
        assert_eq!(actor.holding(Resource::Wood), 0);
        assert!(!actor.has_working_axe());
    }

    #[test]
    fn trade_rejects_illegal_transition() {
        let terms = TradeTerms {
            give: Resource::Wood,
            give_amount: 1,
            take: Resource::Fish,
            take_amount: 1,
        };
        let mut trade = Trade::open(ActorId::new(), ActorId::new(), terms);
        assert!(!trade.transition(TradeStatus::Fulfilled));
        assert_eq!(trade.status, TradeStatus::Moving);
        assert!(trade.transition(TradeStatus::Negotiating));
        assert_eq!(trade.latest_offer().map(|o| o.turn), Some(1));
    }

    #[test]
    fn actor_queues_export_as_arrays() {
        let decl = Actor::decl();
        assert!(decl.contains("Array<EventKind>"));
        assert!(decl.contains("Array<string>"));
    }
}
