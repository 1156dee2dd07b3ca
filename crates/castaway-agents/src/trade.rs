//! Trade settlement between two actors.
//!
//! Nothing is escrowed while a negotiation runs. Affordability is checked
//! at every commit point instead, and [`exchange`] validates both sides
//! before mutating either, so a failed exchange leaves both inventories
//! exactly as they were.

use castaway_types::{Actor, Resource, TradeTerms};

use crate::error::AgentError;
use crate::inventory;

/// Whether `actor` holds at least `amount` of `resource`.
pub fn can_pay(actor: &Actor, resource: Resource, amount: u32) -> bool {
    inventory::has_resource(&actor.inventory, resource, amount)
}

/// Check that `giver` can hand over `terms.give` and `receiver` can hand
/// over `terms.take`. No mutations occur.
pub fn check_affordability(giver: &Actor, receiver: &Actor, terms: TradeTerms) -> Result<(), AgentError> {
    for (party, resource, amount) in [
        (giver, terms.give, terms.give_amount),
        (receiver, terms.take, terms.take_amount),
    ] {
        if !can_pay(party, resource, amount) {
            return Err(AgentError::CannotPay {
                actor: party.id,
                resource,
                needed: amount,
                available: party.holding(resource),
            });
        }
    }
    Ok(())
}

/// Swap goods: `giver` hands `terms.give` to `receiver` and receives
/// `terms.take` in return.
pub fn exchange(giver: &mut Actor, receiver: &mut Actor, terms: TradeTerms) -> Result<(), AgentError> {
    check_affordability(giver, receiver, terms)?;

    // Settle on copies so an overflowing credit commits nothing.
    let mut giver_goods = giver.inventory.clone();
    let mut receiver_goods = receiver.inventory.clone();
    inventory::remove_resource(&mut giver_goods, terms.give, terms.give_amount)?;
    inventory::remove_resource(&mut receiver_goods, terms.take, terms.take_amount)?;
    inventory::add_resource(&mut receiver_goods, terms.give, terms.give_amount)?;
    inventory::add_resource(&mut giver_goods, terms.take, terms.take_amount)?;

    giver.inventory = giver_goods;
    receiver.inventory = receiver_goods;
    Ok(())
}

/// Summary kept in long-term memory ("Gave 5 Wood for 3 Stone").
pub fn describe(terms: TradeTerms) -> String {
    format!("Gave {terms}")
}
