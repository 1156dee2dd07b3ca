//! Actor rules for the Castaway simulation.
//!
//! This crate contains the logic layer for actors -- everything that
//! operates on a single actor's record (or a pair, for trades) without
//! touching the event queue. It sits between `castaway-types` (the data
//! model) and `castaway-core` (the scheduler and dispatcher).
//!
//! # Modules
//!
//! - [`config`] -- Tunables for vitals, action timings and crafting costs
//! - [`crafting`] -- Axe and shelter costs, axe equipping and wear
//! - [`duration`] -- The Action Duration Policy
//! - [`effects`] -- Aggregated invention effects for an actor
//! - [`error`] -- Error types for all actor operations ([`AgentError`])
//! - [`gathering`] -- Gather yield
//! - [`inventory`] -- Checked inventory arithmetic
//! - [`memory`] -- Short-term and long-term memory updates
//! - [`roster`] -- The starting cast
//! - [`trade`] -- Affordability checks and atomic exchange
//! - [`vitals`] -- Decay, restoration, and critical thresholds

pub mod config;
pub mod crafting;
pub mod duration;
pub mod effects;
pub mod error;
pub mod gathering;
pub mod inventory;
pub mod memory;
pub mod roster;
pub mod trade;
pub mod vitals;

// Re-export primary types at crate root for convenience.
pub use config::{ActionTimings, CraftingCosts, VitalsConfig};
pub use crafting::{AXE_DURABILITY, AxeWear};
pub use duration::{DurationInputs, action_duration};
pub use effects::InventionEffects;
pub use error::AgentError;
pub use gathering::gather_yield;
pub use roster::{CastMember, starting_cast};
pub use trade::{can_pay, exchange};
pub use vitals::CriticalVital;
