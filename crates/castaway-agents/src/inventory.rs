//! Inventory operations for actors.
//!
//! Inventories are sparse maps: a resource with quantity zero has no entry.
//! Every debit is validated before anything is mutated, so quantities can
//! never go negative and a failed multi-resource debit leaves the inventory
//! untouched.

use std::collections::BTreeMap;

use castaway_types::Resource;

use crate::error::AgentError;

/// Quantity of `resource` held (zero when absent).
pub fn quantity(inventory: &BTreeMap<Resource, u32>, resource: Resource) -> u32 {
    inventory.get(&resource).copied().unwrap_or(0)
}

/// Check whether the inventory contains at least `amount` of `resource`.
pub fn has_resource(inventory: &BTreeMap<Resource, u32>, resource: Resource, amount: u32) -> bool {
    quantity(inventory, resource) >= amount
}

/// How many more units of `resource` are needed to hold `amount`.
pub fn shortfall(inventory: &BTreeMap<Resource, u32>, resource: Resource, amount: u32) -> u32 {
    amount.saturating_sub(quantity(inventory, resource))
}

/// Whether every entry of `cost` is covered.
pub fn can_afford(inventory: &BTreeMap<Resource, u32>, cost: &BTreeMap<Resource, u32>) -> bool {
    cost.iter()
        .all(|(resource, amount)| has_resource(inventory, *resource, *amount))
}

/// Add `amount` units of `resource` to the inventory.
pub fn add_resource(
    inventory: &mut BTreeMap<Resource, u32>,
    resource: Resource,
    amount: u32,
) -> Result<(), AgentError> {
    if amount == 0 {
        return Ok(());
    }
    let entry = inventory.entry(resource).or_insert(0);
    *entry = entry
        .checked_add(amount)
        .ok_or_else(|| AgentError::ArithmeticOverflow {
            context: format!("adding {amount} {resource} to inventory"),
        })?;
    Ok(())
}

/// Remove `amount` units of `resource` from the inventory.
///
/// Fails if the actor does not hold enough. Removes the key entirely if the
/// quantity reaches zero.
pub fn remove_resource(
    inventory: &mut BTreeMap<Resource, u32>,
    resource: Resource,
    amount: u32,
) -> Result<(), AgentError> {
    let current = quantity(inventory, resource);
    let remaining = current
        .checked_sub(amount)
        .ok_or(AgentError::InsufficientResource {
            resource,
            requested: amount,
            available: current,
        })?;

    if remaining == 0 {
        inventory.remove(&resource);
    } else {
        inventory.insert(resource, remaining);
    }
    Ok(())
}

/// Debit every entry of `cost`, or nothing at all.
pub fn debit(
    inventory: &mut BTreeMap<Resource, u32>,
    cost: &BTreeMap<Resource, u32>,
) -> Result<(), AgentError> {
    if let Some((resource, amount)) = cost
        .iter()
        .find(|(resource, amount)| !has_resource(inventory, **resource, **amount))
    {
        return Err(AgentError::InsufficientResource {
            resource: *resource,
            requested: *amount,
            available: quantity(inventory, *resource),
        });
    }
    for (resource, amount) in cost {
        remove_resource(inventory, *resource, *amount)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn remove_to_zero_drops_the_key() {
        let mut inv = BTreeMap::from([(Resource::Wood, 3)]);
        remove_resource(&mut inv, Resource::Wood, 3).unwrap();
        assert!(inv.is_empty());
    }

    #[test]
    fn remove_more_than_held_fails_without_change() {
        let mut inv = BTreeMap::from([(Resource::Stone, 1)]);
        let err = remove_resource(&mut inv, Resource::Stone, 3).unwrap_err();
        assert!(matches!(
            err,
            AgentError::InsufficientResource {
                requested: 3,
                available: 1,
                ..
            }
        ));
        assert_eq!(quantity(&inv, Resource::Stone), 1);
    }

    #[test]
    fn failed_debit_is_all_or_nothing() {
        let mut inv = BTreeMap::from([(Resource::Wood, 10), (Resource::Stone, 1)]);
        let cost = BTreeMap::from([(Resource::Wood, 5), (Resource::Stone, 2)]);
        assert!(!can_afford(&inv, &cost));
        assert!(debit(&mut inv, &cost).is_err());
        assert_eq!(quantity(&inv, Resource::Wood), 10);
        assert_eq!(quantity(&inv, Resource::Stone), 1);
    }

    #[test]
    fn debit_covers_every_entry() {
        let mut inv = BTreeMap::from([(Resource::Wood, 10), (Resource::Stone, 5)]);
        let cost = BTreeMap::from([(Resource::Wood, 10), (Resource::Stone, 2)]);
        debit(&mut inv, &cost).unwrap();
        assert_eq!(quantity(&inv, Resource::Wood), 0);
        assert_eq!(quantity(&inv, Resource::Stone), 3);
    }

    #[test]
    fn shortfall_saturates() {
        let inv = BTreeMap::from([(Resource::Fish, 2)]);
        assert_eq!(shortfall(&inv, Resource::Fish, 5), 3);
        assert_eq!(shortfall(&inv, Resource::Fish, 1), 0);
    }

    #[test]
    fn add_overflow_is_an_error() {
        let mut inv = BTreeMap::from([(Resource::Coconut, u32::MAX)]);
        assert!(matches!(
            add_resource(&mut inv, Resource::Coconut, 1),
            Err(AgentError::ArithmeticOverflow { .. })
        ));
    }
}
