//! Enumeration types for the Castaway simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A resource an actor can hold in its inventory or tool belt.
///
/// The first four are gathered from world objects. `Axe` only ever appears
/// as a tool and `Shelter` only as a placed world object, but both are
/// listed so costs, trades and displays can name them uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Resource {
    /// Lumber from trees.
    Wood,
    /// Stone from rocks.
    Stone,
    /// Coconuts from trees; edible.
    Coconut,
    /// Fish from water tiles; edible.
    Fish,
    /// A crafted axe (tool).
    Axe,
    /// A built shelter.
    Shelter,
}

impl Resource {
    /// Every resource that can be gathered from a world object.
    pub const GATHERABLE: [Self; 4] = [Self::Wood, Self::Stone, Self::Coconut, Self::Fish];

    /// The kind of world object this resource is gathered from, if any.
    pub const fn source_kind(self) -> Option<ObjectKind> {
        match self {
            Self::Wood | Self::Coconut => Some(ObjectKind::Tree),
            Self::Stone => Some(ObjectKind::Rock),
            Self::Fish => Some(ObjectKind::Water),
            Self::Axe | Self::Shelter => None,
        }
    }

    /// Whether eating this resource restores hunger.
    pub const fn is_food(self) -> bool {
        matches!(self, Self::Coconut | Self::Fish)
    }
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Wood => "Wood",
            Self::Stone => "Stone",
            Self::Coconut => "Coconut",
            Self::Fish => "Fish",
            Self::Axe => "Axe",
            Self::Shelter => "Shelter",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Season of the simulated year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Season {
    /// Days 0 to 90 of the year.
    Spring,
    /// Days 91 to 181.
    Summer,
    /// Days 182 to 272.
    Autumn,
    /// Days 273 to 363.
    Winter,
}

impl Season {
    /// Derive the season from a zero-based day of the year.
    pub const fn from_day_of_year(day: u64) -> Self {
        if day < 91 {
            Self::Spring
        } else if day < 182 {
            Self::Summer
        } else if day < 273 {
            Self::Autumn
        } else {
            Self::Winter
        }
    }
}

/// The kind of a placed world object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ObjectKind {
    /// Yields wood and coconuts; removed once enough wood is extracted.
    Tree,
    /// Yields stone.
    Rock,
    /// Yields fish.
    Water,
    /// An actor-owned shelter.
    Shelter,
}

// ---------------------------------------------------------------------------
// Trade
// ---------------------------------------------------------------------------

/// Status of a trade negotiation.
///
/// Allowed transitions:
///
/// ```text
/// Moving -> Negotiating | Failed (initiator abandoned the approach)
/// Negotiating -> Negotiating (counter-offer) | Gathering | Accepted | Rejected | Failed
/// Gathering -> Finalizing
/// Finalizing -> Fulfilled | Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TradeStatus {
    /// The initiator is travelling to the recipient.
    Moving,
    /// An offer is awaiting the decision-maker's answer.
    Negotiating,
    /// The recipient agreed but must gather the goods first.
    Gathering,
    /// The gatherer is settling a previously agreed trade.
    Finalizing,
    /// Goods were exchanged on acceptance.
    Accepted,
    /// The offer was declined or negotiations broke down.
    Rejected,
    /// A gathered trade was settled successfully.
    Fulfilled,
    /// A party could not pay at commit time.
    Failed,
}

impl TradeStatus {
    /// Whether no further transitions are possible.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::Rejected | Self::Fulfilled | Self::Failed
        )
    }

    /// Whether a trade may move from `self` to `next`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Moving => matches!(next, Self::Negotiating | Self::Failed),
            Self::Negotiating => matches!(
                next,
                Self::Negotiating
                    | Self::Gathering
                    | Self::Accepted
                    | Self::Rejected
                    | Self::Failed
            ),
            Self::Gathering => matches!(next, Self::Finalizing),
            Self::Finalizing => matches!(next, Self::Fulfilled | Self::Failed),
            Self::Accepted | Self::Rejected | Self::Fulfilled | Self::Failed => false,
        }
    }
}

impl core::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Moving => "Moving",
            Self::Negotiating => "Negotiating",
            Self::Gathering => "Gathering",
            Self::Finalizing => "Finalizing",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::Fulfilled => "Fulfilled",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// The answer a decision-maker gives to a trade offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TradeDecisionKind {
    /// Exchange immediately.
    Accept,
    /// Decline.
    Reject,
    /// Propose different terms.
    Counter,
    /// Agree, but gather the requested goods before settling.
    AcceptAndGather,
}

impl core::fmt::Display for TradeDecisionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Counter => "counter",
            Self::AcceptAndGather => "accept_and_gather",
        })
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// Whether an actor currently owns a shelter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum HousingStatus {
    /// No shelter on the island belongs to the actor.
    Unhoused,
    /// The actor owns a shelter.
    HasShelter,
}

/// Whether an actor currently carries a working tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ToolStatus {
    /// No tools.
    NoTools,
    /// A working axe.
    HasAxe,
}

impl core::fmt::Display for HousingStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Unhoused => "Unhoused",
            Self::HasShelter => "Has Shelter",
        })
    }
}

impl core::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::NoTools => "No Tools",
            Self::HasAxe => "Has Axe",
        })
    }
}

// ---------------------------------------------------------------------------
// Inventions
// ---------------------------------------------------------------------------

/// Generic category an invention is fleshed out from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum InventionCategory {
    /// Better tools for gathering.
    ToolImprovement,
    /// Keeping food longer.
    FoodPreservation,
    /// Better living conditions.
    ShelterImprovement,
    /// Getting more out of each resource.
    ResourceEfficiency,
}

impl InventionCategory {
    /// All categories, in a fixed order for uniform sampling.
    pub const ALL: [Self; 4] = [
        Self::ToolImprovement,
        Self::FoodPreservation,
        Self::ShelterImprovement,
        Self::ResourceEfficiency,
    ];

    /// Human-readable form used in prompts ("TOOL IMPROVEMENT").
    pub const fn label(self) -> &'static str {
        match self {
            Self::ToolImprovement => "TOOL IMPROVEMENT",
            Self::FoodPreservation => "FOOD PRESERVATION",
            Self::ShelterImprovement => "SHELTER IMPROVEMENT",
            Self::ResourceEfficiency => "RESOURCE EFFICIENCY",
        }
    }
}

/// A vital statistic that decays over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum VitalStat {
    /// Satiety; decreases toward starvation.
    Hunger,
    /// Stamina; restored by sleeping.
    Energy,
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

/// Severity category of a user-visible log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum LogKind {
    /// Engine notices: interruptions, failures, stale responses.
    System,
    /// Outcomes: arrivals, completions, world changes.
    Info,
    /// An actor starting something.
    Action,
    /// Negotiation progress.
    Trade,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_thresholds() {
        assert_eq!(Season::from_day_of_year(0), Season::Spring);
        assert_eq!(Season::from_day_of_year(90), Season::Spring);
        assert_eq!(Season::from_day_of_year(91), Season::Summer);
        assert_eq!(Season::from_day_of_year(181), Season::Summer);
        assert_eq!(Season::from_day_of_year(182), Season::Autumn);
        assert_eq!(Season::from_day_of_year(272), Season::Autumn);
        assert_eq!(Season::from_day_of_year(273), Season::Winter);
        assert_eq!(Season::from_day_of_year(363), Season::Winter);
    }

    #[test]
    fn resource_sources() {
        assert_eq!(Resource::Wood.source_kind(), Some(ObjectKind::Tree));
        assert_eq!(Resource::Coconut.source_kind(), Some(ObjectKind::Tree));
        assert_eq!(Resource::Stone.source_kind(), Some(ObjectKind::Rock));
        assert_eq!(Resource::Fish.source_kind(), Some(ObjectKind::Water));
        assert_eq!(Resource::Axe.source_kind(), None);
    }

    #[test]
    fn trade_status_never_skips_to_fulfilled() {
        assert!(!TradeStatus::Moving.can_transition_to(TradeStatus::Fulfilled));
        assert!(!TradeStatus::Negotiating.can_transition_to(TradeStatus::Fulfilled));
        assert!(TradeStatus::Finalizing.can_transition_to(TradeStatus::Fulfilled));
    }

    #[test]
    fn terminal_statuses_are_final() {
        for terminal in [
            TradeStatus::Accepted,
            TradeStatus::Rejected,
            TradeStatus::Fulfilled,
            TradeStatus::Failed,
        ] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(TradeStatus::Negotiating));
        }
    }

    #[test]
    fn decision_kind_uses_snake_case() {
        let json = serde_json::to_string(&TradeDecisionKind::AcceptAndGather).ok();
        assert_eq!(json.as_deref(), Some("\"accept_and_gather\""));
    }
}
