//! Axes and shelters.
//!
//! Crafting and building debit their configured cost on completion. An axe
//! starts at full durability and wears by a fixed amount on every wood
//! gather; it is removed once durability reaches zero.

use castaway_types::{Actor, Resource};

use crate::config::CraftingCosts;
use crate::error::AgentError;
use crate::inventory;

/// Durability of a freshly crafted axe.
pub const AXE_DURABILITY: u32 = 100;

/// What happened to an actor's axe after a wood gather.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxeWear {
    /// The actor had no working axe.
    NoAxe,
    /// The axe is still usable with this much durability left.
    Worn(u32),
    /// The axe broke and was removed.
    Broke,
}

/// Debit the axe cost and equip a fresh axe.
pub fn craft_axe(actor: &mut Actor, costs: &CraftingCosts) -> Result<(), AgentError> {
    inventory::debit(&mut actor.inventory, &costs.axe)?;
    actor.tools.insert(Resource::Axe, AXE_DURABILITY);
    Ok(())
}

/// Debit the shelter cost. Placing the shelter is the world's job.
pub fn pay_for_shelter(actor: &mut Actor, costs: &CraftingCosts) -> Result<(), AgentError> {
    inventory::debit(&mut actor.inventory, &costs.shelter)
}

/// Wear the actor's axe by `rate`, removing it at zero.
pub fn wear_axe(actor: &mut Actor, rate: u32) -> AxeWear {
    let Some(durability) = actor.tools.get_mut(&Resource::Axe) else {
        return AxeWear::NoAxe;
    };
    if *durability == 0 {
        return AxeWear::NoAxe;
    }
    *durability = durability.saturating_sub(rate);
    if *durability == 0 {
        actor.tools.remove(&Resource::Axe);
        return AxeWear::Broke;
    }
    AxeWear::Worn(*durability)
}
