//! Error types for the `castaway-world` crate.

use castaway_types::ObjectId;

/// Errors that can occur during world operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The requested map has no cells.
    #[error("map dimensions {width}x{height} contain no cells")]
    EmptyMap {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A world object was not found in the registry.
    #[error("world object not found: {0}")]
    ObjectNotFound(ObjectId),
}
