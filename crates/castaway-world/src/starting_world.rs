//! Initial object population for a new session.
//!
//! Trees, rocks and water sources are scattered over random free land
//! tiles. When the island runs out of free land the remaining objects are
//! skipped with a warning; a cramped island is still playable.

use castaway_types::ObjectKind;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::island::Island;
use crate::objects::{ObjectRegistry, new_object};

/// How many of each source to place at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingObjects {
    /// Trees (wood, coconuts).
    pub trees: u32,
    /// Rocks (stone).
    pub rocks: u32,
    /// Water sources (fish).
    pub water: u32,
}

impl Default for StartingObjects {
    fn default() -> Self {
        Self {
            trees: 4,
            rocks: 2,
            water: 4,
        }
    }
}

/// Place the starting objects on `island`.
pub fn populate(island: &Island, counts: StartingObjects, rng: &mut impl Rng) -> ObjectRegistry {
    let mut registry = ObjectRegistry::new();
    let plan = [
        (ObjectKind::Tree, counts.trees),
        (ObjectKind::Rock, counts.rocks),
        (ObjectKind::Water, counts.water),
    ];

    for (kind, count) in plan {
        for placed in 0..count {
            let occupied = registry.occupied();
            let Some(position) = island.find_random_land_position(&occupied, rng) else {
                warn!(?kind, placed, requested = count, "no free land left for starting object");
                break;
            };
            registry.insert(new_object(kind, position));
        }
    }

    info!(objects = registry.len(), "starting world populated");
    registry
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn default_population_counts() {
        let island = Island::all_land(10, 10).unwrap();
        let registry = populate(&island, StartingObjects::default(), &mut StdRng::seed_from_u64(5));
        let count = |kind| registry.iter().filter(|o| o.kind == kind).count();
        assert_eq!(count(ObjectKind::Tree), 4);
        assert_eq!(count(ObjectKind::Rock), 2);
        assert_eq!(count(ObjectKind::Water), 4);
    }

    #[test]
    fn objects_never_share_a_cell() {
        let island = Island::all_land(4, 4).unwrap();
        let registry = populate(&island, StartingObjects::default(), &mut StdRng::seed_from_u64(9));
        let cells: BTreeSet<_> = registry.iter().map(|o| o.position).collect();
        assert_eq!(cells.len(), registry.len());
    }

    #[test]
    fn cramped_island_skips_what_does_not_fit() {
        let island = Island::all_land(2, 2).unwrap();
        let registry = populate(&island, StartingObjects::default(), &mut StdRng::seed_from_u64(1));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let counts: StartingObjects = serde_json::from_str(r#"{"trees": 9}"#).unwrap();
        assert_eq!(counts.trees, 9);
        assert_eq!(counts.rocks, 2);
    }
}
