//! The starting cast.
//!
//! Two castaways with complementary strengths: Robinson is better with wood
//! and stone, Friday is the better fisher. Positions are assigned at session
//! start from random free land.

use std::collections::BTreeMap;

use castaway_types::{Actor, Position, Resource, Vitals};

/// Template for one starting actor.
#[derive(Debug, Clone, PartialEq)]
pub struct CastMember {
    /// Display name.
    pub name: &'static str,
    /// Starting energy and hunger.
    pub vitals: Vitals,
    /// Starting inventory.
    pub inventory: BTreeMap<Resource, u32>,
    /// Per-resource productivity multipliers.
    pub productivity: BTreeMap<Resource, f64>,
}

impl CastMember {
    /// Create the actor at `position`.
    pub fn spawn(&self, position: Position) -> Actor {
        let mut actor = Actor::new(self.name, position, self.vitals);
        actor.inventory = self.inventory.clone();
        actor.productivity = self.productivity.clone();
        actor
    }
}

/// The default two-person cast.
pub fn starting_cast() -> Vec<CastMember> {
    vec![
        CastMember {
            name: "Robinson",
            vitals: Vitals {
                energy: 100.0,
                hunger: 80.0,
            },
            inventory: BTreeMap::from([(Resource::Wood, 3)]),
            productivity: BTreeMap::from([
                (Resource::Wood, 1.2),
                (Resource::Stone, 1.1),
                (Resource::Coconut, 1.2),
                (Resource::Fish, 0.7),
            ]),
        },
        CastMember {
            name: "Friday",
            vitals: Vitals {
                energy: 100.0,
                hunger: 85.0,
            },
            inventory: BTreeMap::from([(Resource::Coconut, 3), (Resource::Wood, 1)]),
            productivity: BTreeMap::from([
                (Resource::Wood, 0.7),
                (Resource::Stone, 0.8),
                (Resource::Coconut, 0.8),
                (Resource::Fish, 1.3),
            ]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use castaway_types::{HousingStatus, ToolStatus};

    use super::*;

    #[test]
    fn cast_starts_idle_and_unequipped() {
        let cast = starting_cast();
        assert_eq!(cast.len(), 2);
        let robinson = cast.first().map(|m| m.spawn(Position::new(3, 3)));
        let robinson = robinson.as_ref();
        assert_eq!(robinson.map(|a| a.holding(Resource::Wood)), Some(3));
        assert_eq!(robinson.map(Actor::is_idle), Some(true));
        assert_eq!(
            robinson.map(|a| a.long_term_memory.housing),
            Some(HousingStatus::Unhoused)
        );
        assert_eq!(
            robinson.map(|a| a.long_term_memory.tools),
            Some(ToolStatus::NoTools)
        );
    }

    #[test]
    fn friday_fishes_better() {
        let cast = starting_cast();
        let friday = cast.get(1).map(|m| m.spawn(Position::new(17, 17)));
        let fish = friday.as_ref().map(|a| a.productivity_for(Resource::Fish));
        assert!(fish.is_some_and(|p| p > 1.0));
    }
}
