//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity on the island has a strongly-typed ID so actors, objects,
//! trades and inventions can never be mixed up at compile time. All IDs use
//! UUID v7 (time-ordered), which keeps `BTreeMap` iteration in creation
//! order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a castaway (actor) on the island.
    ActorId
}

define_id! {
    /// Unique identifier for a placed world object (tree, rock, water, shelter).
    ObjectId
}

define_id! {
    /// Unique identifier for a trade negotiation between two actors.
    TradeId
}

define_id! {
    /// Unique identifier for a discovered invention.
    InventionId
}

define_id! {
    /// Session token regenerated on every reset.
    ///
    /// Asynchronous collaborator requests capture the epoch at dispatch time;
    /// a response whose epoch no longer matches is discarded unapplied.
    SimulationEpoch
}

impl ObjectId {
    /// The identifier of the shelter owned by `owner`.
    ///
    /// Shelter identity is derived from the owner so that building a new
    /// shelter replaces the previous one and at most one exists per owner.
    pub fn shelter_of(owner: ActorId) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, owner.0.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let actor = ActorId::new();
        let object = ObjectId::new();
        assert_ne!(actor.into_inner(), Uuid::nil());
        assert_ne!(object.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = TradeId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }

    #[test]
    fn shelter_id_is_stable_per_owner() {
        let owner = ActorId::new();
        assert_eq!(ObjectId::shelter_of(owner), ObjectId::shelter_of(owner));
        assert_ne!(ObjectId::shelter_of(owner), ObjectId::shelter_of(ActorId::new()));
    }

    #[test]
    fn epochs_differ_across_resets() {
        assert_ne!(SimulationEpoch::new(), SimulationEpoch::new());
    }
}
