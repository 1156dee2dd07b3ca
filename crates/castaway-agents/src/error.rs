//! Error types for the castaway-agents crate.
//!
//! All operations that can fail return typed errors rather than panicking.

use castaway_types::{ActorId, Resource};

/// Errors that can occur during actor state operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Attempted to remove more of a resource than the actor holds.
    #[error("insufficient resource: wanted {requested} {resource} but only have {available}")]
    InsufficientResource {
        /// The resource being removed.
        resource: Resource,
        /// The quantity the caller attempted to remove.
        requested: u32,
        /// The quantity the actor actually holds.
        available: u32,
    },

    /// A trade party cannot pay its side of the exchange.
    #[error("actor {actor} cannot pay {needed} {resource} (holds {available})")]
    CannotPay {
        /// The party that came up short.
        actor: ActorId,
        /// The resource owed.
        resource: Resource,
        /// The quantity owed.
        needed: u32,
        /// The quantity held.
        available: u32,
    },

    /// An arithmetic overflow occurred.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },
}
