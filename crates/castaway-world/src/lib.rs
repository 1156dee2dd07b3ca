//! Geography and placed objects for the Castaway simulation.
//!
//! This crate models the physical island: a boolean traversability grid
//! generated once per session, and the mutable set of world objects placed
//! on it (trees, rocks, water sources, shelters).
//!
//! # Modules
//!
//! - [`error`] -- Error types for world operations.
//! - [`island`] -- Cellular-automaton island generation and random land
//!   placement.
//! - [`objects`] -- [`ObjectRegistry`]: nearest-source lookup, build-spot
//!   search, wood depletion, regrowth, and shelter ownership.
//! - [`starting_world`] -- The initial object population for a new session.

pub mod error;
pub mod island;
pub mod objects;
pub mod starting_world;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use island::Island;
pub use objects::{ObjectRegistry, WoodExtraction, new_object};
pub use starting_world::{StartingObjects, populate};
