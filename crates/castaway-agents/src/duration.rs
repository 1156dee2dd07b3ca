//! The Action Duration Policy.
//!
//! A pure function from (actor, configuration, owned inventions) to the
//! number of ticks the actor's current action takes. Every duration is at
//! least one tick.
//!
//! | Action | Ticks |
//! |--------|-------|
//! | Gathering | `ceil(gather / productivity)`, gather halved for wood with an axe |
//! | Moving | `max(1, ceil(distance / map_width * move))`, 1 when already there |
//! | Sleeping | `ceil(sleep / shelter_multiplier)` at own shelter, else `sleep` |
//! | Eating | `consume` |
//! | Crafting | `craft` |
//! | Building | `build` |
//! | Thinking | `thinking` |
//! | anything else | 1 |

use castaway_types::{ActionState, Actor, Position, Resource};

use crate::config::{ActionTimings, VitalsConfig};
use crate::effects::InventionEffects;

/// The configuration slices the policy reads.
#[derive(Debug, Clone, Copy)]
pub struct DurationInputs<'a> {
    /// Base action durations.
    pub timings: &'a ActionTimings,
    /// Provides the shelter sleep multiplier.
    pub vitals: &'a VitalsConfig,
    /// Map width in cells; travel time scales with distance over width.
    pub map_width: u32,
}

/// Ticks needed to complete `actor`'s current action.
pub fn action_duration(actor: &Actor, inputs: &DurationInputs<'_>, effects: &InventionEffects) -> u32 {
    let timings = inputs.timings;
    match &actor.action {
        ActionState::Gathering { resource, .. } => gather_duration(actor, *resource, timings, effects),
        ActionState::Moving { destination, .. } | ActionState::MovingToTrade { destination, .. } => {
            travel_duration(actor.position, *destination, inputs.map_width, timings.move_ticks)
        }
        ActionState::Sleeping { at_shelter: true } => {
            ticks(f64::from(timings.sleep) / inputs.vitals.sleep_in_shelter_multiplier)
        }
        ActionState::Sleeping { at_shelter: false } => timings.sleep.max(1),
        ActionState::Eating { .. } => timings.consume.max(1),
        ActionState::CraftingAxe => timings.craft.max(1),
        ActionState::BuildingShelter | ActionState::BuildingInvention { .. } => timings.build.max(1),
        ActionState::Thinking => timings.thinking.max(1),
        ActionState::Idle
        | ActionState::Negotiating { .. }
        | ActionState::AwaitingTradeResponse { .. } => 1,
    }
}

fn gather_duration(
    actor: &Actor,
    resource: Resource,
    timings: &ActionTimings,
    effects: &InventionEffects,
) -> u32 {
    let mut base = f64::from(timings.gather);
    if resource == Resource::Wood && actor.has_working_axe() {
        base /= 2.0;
    }
    let productivity = actor.productivity_for(resource) * effects.productivity_multiplier(resource);
    if productivity <= 0.0 {
        return ticks(base);
    }
    ticks(base / productivity)
}

fn travel_duration(from: Position, to: Position, map_width: u32, move_ticks: u32) -> u32 {
    let distance = from.distance_to(to);
    if distance <= 0.0 || map_width == 0 {
        return 1;
    }
    ticks(distance / f64::from(map_width) * f64::from(move_ticks))
}

/// Round up to whole ticks, never below one.
fn ticks(value: f64) -> u32 {
    ceil_u32(value).max(1)
}

/// `ceil(value)` as `u32`, saturating; NaN and negatives become zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn ceil_u32(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        value.ceil() as u32
    }
}
