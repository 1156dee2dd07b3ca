//! Gather yield.
//!
//! One completed gather cycle yields `ceil(productivity)` units, or
//! `ceil(3 * productivity)` for wood when the actor carries a working axe,
//! plus any flat bonus from owned yield inventions. Productivity here is the
//! actor's own multiplier; boost inventions speed gathering up instead (see
//! [`crate::duration`]).

use castaway_types::{Actor, Resource};

use crate::duration::ceil_u32;
use crate::effects::InventionEffects;

/// Wood yield multiplier while carrying a working axe.
const AXE_WOOD_YIELD: f64 = 3.0;

/// Units of `resource` produced by one completed gather cycle.
pub fn gather_yield(actor: &Actor, resource: Resource, effects: &InventionEffects) -> u32 {
    let productivity = actor.productivity_for(resource);
    let base = if resource == Resource::Wood && actor.has_working_axe() {
        ceil_u32(AXE_WOOD_YIELD * productivity)
    } else {
        ceil_u32(productivity)
    };
    base.saturating_add(effects.yield_bonus(resource))
}
