//! The per-actor action state machine's states.
//!
//! Each state carries exactly the data needed to finish it, so completing an
//! action never has to consult a side payload.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Resource;
use crate::event::Event;
use crate::ids::{InventionId, ObjectId, TradeId};
use crate::structs::Position;

/// What an actor is doing right now.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(tag = "state")]
#[ts(export, export_to = "bindings/")]
pub enum ActionState {
    /// Waiting for the next intent. Initial state and the end of every cycle.
    #[default]
    Idle,
    /// Waiting for the reasoning collaborator's goal decision.
    Thinking,
    /// Walking to `destination`.
    Moving {
        /// Where the actor is heading.
        destination: Position,
        /// Event front-queued on arrival.
        then: Option<Box<Event>>,
    },
    /// Collecting `resource` from `source`.
    Gathering {
        /// What is being gathered.
        resource: Resource,
        /// The object being harvested.
        source: ObjectId,
        /// Total requested by the plan step, if any.
        target_amount: Option<u32>,
        /// Collected so far in this plan step.
        gathered: u32,
    },
    /// Restoring energy.
    Sleeping {
        /// Whether the actor sleeps on its own shelter.
        at_shelter: bool,
    },
    /// Eating one unit of `resource`.
    Eating {
        /// The food being eaten.
        resource: Resource,
    },
    /// Crafting an axe.
    CraftingAxe,
    /// Building a shelter at the current position.
    BuildingShelter,
    /// Building a discovered invention.
    BuildingInvention {
        /// The invention being built.
        invention: InventionId,
    },
    /// Considering a trade offer.
    Negotiating {
        /// The negotiation in progress.
        trade: TradeId,
    },
    /// Waiting for the partner to answer an offer.
    AwaitingTradeResponse {
        /// The negotiation in progress.
        trade: TradeId,
    },
    /// Walking to a partner to open a negotiation.
    MovingToTrade {
        /// The negotiation being opened.
        trade: TradeId,
        /// The partner's position when the trade was proposed.
        destination: Position,
        /// The negotiate event front-queued on arrival.
        then: Box<Event>,
    },
}

impl ActionState {
    /// Whether the actor is idle.
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether this state is held open until a negotiation resolves.
    ///
    /// Such states are not advanced by the scheduler's progress counter.
    pub const fn awaits_negotiation(&self) -> bool {
        matches!(
            self,
            Self::Negotiating { .. } | Self::AwaitingTradeResponse { .. }
        )
    }

    /// The travel destination of a walking state.
    pub const fn destination(&self) -> Option<Position> {
        match self {
            Self::Moving { destination, .. } | Self::MovingToTrade { destination, .. } => {
                Some(*destination)
            }
            _ => None,
        }
    }

    /// Human-readable label ("Gathering Wood", "Building Shelter").
    pub fn label(&self) -> String {
        match self {
            Self::Idle => String::from("Idle"),
            Self::Thinking => String::from("Thinking..."),
            Self::Moving { .. } => String::from("Moving"),
            Self::Gathering { resource, .. } => format!("Gathering {resource}"),
            Self::Sleeping { .. } => String::from("Sleeping"),
            Self::Eating { .. } => String::from("Eating"),
            Self::CraftingAxe => String::from("Crafting Axe"),
            Self::BuildingShelter => String::from("Building Shelter"),
            Self::BuildingInvention { .. } => String::from("Building Invention"),
            Self::Negotiating { .. } => String::from("Negotiating"),
            Self::AwaitingTradeResponse { .. } => String::from("Awaiting Trade Response"),
            Self::MovingToTrade { .. } => String::from("Moving to Trade"),
        }
    }
}
