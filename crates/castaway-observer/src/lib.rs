//! Observer and control API server for the Castaway simulation.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for reading the session: clock, actors, objects,
//!   trades, inventions, the event log and the island grid
//! - **`WebSocket` endpoint** (`/ws/ticks`) streaming tick summaries via
//!   [`tokio::sync::broadcast`]
//! - **Operator endpoints** for start, stop, reset, speed, configuration
//!   and shutdown
//!
//! # Architecture
//!
//! The observer reads from an in-memory [`SimulationSnapshot`] that the
//! engine replaces after each tick, so it never blocks the tick cycle.
//! Control requests only set [`OperatorState`] flags that the run loop
//! honours between ticks.
//!
//! [`SimulationSnapshot`]: state::SimulationSnapshot
//! [`OperatorState`]: castaway_core::OperatorState

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerConfig, ServerError, spawn_observer, start_server};
pub use state::{AppState, SimulationSnapshot, TickBroadcast};
