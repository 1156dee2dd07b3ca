//! The registry of placed world objects.
//!
//! [`ObjectRegistry`] owns every tree, rock, water source and shelter on the
//! island. It answers the spatial questions the scheduler and dispatcher ask
//! (nearest source of a resource, a clear cell to build on) and applies the
//! few world mutations the rules allow: wood depletion, regrowth, and
//! shelter placement and destruction.

use std::collections::{BTreeMap, BTreeSet};

use castaway_types::{ActorId, ObjectId, ObjectKind, Position, Resource, WorldObject};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorldError;
use crate::island::Island;

/// Nominal wood stock of a fresh tree.
const TREE_WOOD_STOCK: u32 = 50;
/// Nominal coconut stock of a fresh tree.
const TREE_COCONUT_STOCK: u32 = 10;
/// Nominal stone stock of a rock.
const ROCK_STONE_STOCK: u32 = 50;
/// Nominal fish stock of a water source.
const WATER_FISH_STOCK: u32 = 100;

/// Build a fresh object of `kind` at `position`.
///
/// Shelters built this way have no owner; use
/// [`ObjectRegistry::place_shelter`] for an owned shelter.
pub fn new_object(kind: ObjectKind, position: Position) -> WorldObject {
    let stock = match kind {
        ObjectKind::Tree => BTreeMap::from([
            (Resource::Wood, TREE_WOOD_STOCK),
            (Resource::Coconut, TREE_COCONUT_STOCK),
        ]),
        ObjectKind::Rock => BTreeMap::from([(Resource::Stone, ROCK_STONE_STOCK)]),
        ObjectKind::Water => BTreeMap::from([(Resource::Fish, WATER_FISH_STOCK)]),
        ObjectKind::Shelter => BTreeMap::new(),
    };
    WorldObject {
        id: ObjectId::new(),
        kind,
        position,
        owner: None,
        stock,
        wood_extracted: 0,
    }
}

/// Result of taking wood from a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WoodExtraction {
    /// The tree still stands with this much wood extracted in total.
    Standing(u32),
    /// The tree reached the depletion limit and was removed.
    Depleted,
}

/// Every placed object on the island, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRegistry {
    /// Objects indexed by their identifier.
    objects: BTreeMap<ObjectId, WorldObject>,
}

impl ObjectRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
        }
    }

    /// Add `object`, replacing any object with the same id.
    pub fn insert(&mut self, object: WorldObject) -> ObjectId {
        let id = object.id;
        self.objects.insert(id, object);
        id
    }

    /// Look up an object.
    pub fn get(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects.get(&id)
    }

    /// Remove an object, returning it.
    pub fn remove(&mut self, id: ObjectId) -> Option<WorldObject> {
        self.objects.remove(&id)
    }

    /// Number of placed objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over all objects in id order.
    pub fn iter(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.values()
    }

    /// Every cell that holds an object.
    pub fn occupied(&self) -> BTreeSet<Position> {
        self.objects.values().map(|o| o.position).collect()
    }

    /// Whether any object stands on `position`.
    pub fn is_occupied(&self, position: Position) -> bool {
        self.objects.values().any(|o| o.position == position)
    }

    /// The closest object that yields `resource`, measured from `from`.
    ///
    /// Ties resolve to the object with the lowest id.
    pub fn nearest_source(&self, resource: Resource, from: Position) -> Option<&WorldObject> {
        let kind = resource.source_kind()?;
        self.objects
            .values()
            .filter(|o| o.kind == kind)
            .min_by(|a, b| {
                a.position
                    .distance_to(from)
                    .total_cmp(&b.position.distance_to(from))
            })
    }

    /// A clear land cell to build on: `from` itself, then its north, east,
    /// south and west neighbours. `None` when all five are blocked.
    pub fn find_build_spot(&self, island: &Island, from: Position) -> Option<Position> {
        core::iter::once(Some(from))
            .chain(from.neighbours())
            .flatten()
            .find(|spot| island.is_land(*spot) && !self.is_occupied(*spot))
    }

    // -------------------------------------------------------------------
    // Trees
    // -------------------------------------------------------------------

    /// Record `amount` wood taken from tree `id`.
    ///
    /// A tree whose extracted total reaches `limit` is removed.
    pub fn extract_wood(
        &mut self,
        id: ObjectId,
        amount: u32,
        limit: u32,
    ) -> Result<WoodExtraction, WorldError> {
        let tree = self
            .objects
            .get_mut(&id)
            .ok_or(WorldError::ObjectNotFound(id))?;
        tree.wood_extracted = tree.wood_extracted.saturating_add(amount);
        if tree.wood_extracted >= limit {
            self.objects.remove(&id);
            debug!(object = %id, "tree depleted");
            return Ok(WoodExtraction::Depleted);
        }
        Ok(WoodExtraction::Standing(tree.wood_extracted))
    }

    /// Grow a new tree on a random free land tile.
    ///
    /// `blocked` lists extra cells to avoid (e.g. actor positions).
    pub fn spawn_tree(
        &mut self,
        island: &Island,
        blocked: &BTreeSet<Position>,
        rng: &mut impl Rng,
    ) -> Option<ObjectId> {
        let mut occupied = self.occupied();
        occupied.extend(blocked.iter().copied());
        let position = island.find_random_land_position(&occupied, rng)?;
        Some(self.insert(new_object(ObjectKind::Tree, position)))
    }

    // -------------------------------------------------------------------
    // Shelters
    // -------------------------------------------------------------------

    /// The shelter owned by `owner`, if it still stands.
    pub fn shelter_of(&self, owner: ActorId) -> Option<&WorldObject> {
        self.objects.get(&ObjectId::shelter_of(owner))
    }

    /// Place `owner`'s shelter at `position`, replacing any previous one.
    pub fn place_shelter(&mut self, owner: ActorId, position: Position) -> ObjectId {
        let mut shelter = new_object(ObjectKind::Shelter, position);
        shelter.id = ObjectId::shelter_of(owner);
        shelter.owner = Some(owner);
        self.insert(shelter)
    }

    /// Every standing shelter as `(shelter id, owner)`.
    pub fn shelters(&self) -> Vec<(ObjectId, ActorId)> {
        self.objects
            .values()
            .filter(|o| o.kind == ObjectKind::Shelter)
            .filter_map(|o| o.owner.map(|owner| (o.id, owner)))
            .collect()
    }
}
