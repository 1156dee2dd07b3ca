//! Shared type definitions for the Castaway island simulation.
//!
//! This crate is the single source of truth for the data model used across
//! the workspace. Types flow to `TypeScript` via `ts-rs` for the observer
//! dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for actors, objects, trades,
//!   inventions and the session epoch
//! - [`enums`] -- Resources, seasons, object kinds, trade statuses, log kinds
//! - [`action`] -- The tagged per-actor action state
//! - [`event`] -- Queued intents, trade terms and offers
//! - [`structs`] -- Actors, world objects, trades, inventions, log entries

pub mod action;
pub mod enums;
pub mod event;
pub mod ids;
pub mod structs;

pub use action::ActionState;
pub use enums::{
    HousingStatus, InventionCategory, LogKind, ObjectKind, Resource, Season, ToolStatus,
    TradeDecisionKind, TradeStatus, VitalStat,
};
pub use event::{Event, EventKind, TradeOffer, TradeTerms};
pub use ids::{ActorId, InventionId, ObjectId, SimulationEpoch, TradeId};
pub use structs::{
    Actor, Invention, InventionEffect, LastTrade, LogEntry, LongTermMemory, PendingTrade,
    Position, Trade, Vitals, WorldObject,
};
