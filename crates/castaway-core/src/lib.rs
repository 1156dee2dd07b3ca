//! Scheduler, dispatcher, and orchestration for the Castaway simulation.
//!
//! This crate owns the tick cycle that drives a session: clock advance,
//! critical-vital interruption, action progress, invention rolls, one
//! dispatcher pass over the event queue, world events, and the idle check.
//! Collaborator requests staged during a tick are executed by the async
//! run loop and their answers are applied between ticks.
//!
//! # Modules
//!
//! - [`clock`] -- Hour counter, day labels, and season derivation.
//! - [`collaborator`] -- Request and response envelopes exchanged with the
//!   reasoning collaborator.
//! - [`config`] -- Configuration loading from `castaway-config.yaml` into
//!   strongly-typed structs.
//! - [`context`] -- [`SimulationContext`], all mutable state of a session.
//! - [`dispatcher`] -- Turns the queue head into an action or a request.
//! - [`log`] -- The user-visible, de-duplicating event log.
//! - [`negotiation`] -- The trade negotiation protocol.
//! - [`operator`] -- Shared start/stop/reset/speed control state.
//! - [`queue`] -- FIFO event queue with front-insertion.
//! - [`reasoner`] -- [`Reasoner`] trait, bounded execution, and the
//!   deterministic fallback collaborator.
//! - [`responses`] -- Applying collaborator answers, with staleness checks.
//! - [`runner`] -- The async run loop with operator controls.
//! - [`tick`] -- One simulated hour.
//!
//! [`SimulationContext`]: context::SimulationContext
//! [`Reasoner`]: reasoner::Reasoner

pub mod clock;
pub mod collaborator;
pub mod config;
pub mod context;
mod discovery;
pub mod dispatcher;
pub mod log;
pub mod negotiation;
pub mod operator;
pub mod queue;
pub mod reasoner;
pub mod responses;
pub mod runner;
pub mod tick;

pub use config::SimulationConfig;
pub use context::{ContextError, SimulationContext};
pub use operator::{OperatorState, SimulationEndReason, SimulationStatus};
pub use reasoner::{FallbackReasoner, Reasoner, ReasonerError};
pub use runner::{NoOpCallback, RunnerError, SimulationResult, TickCallback, run_simulation};
pub use tick::{TickError, TickSummary};
