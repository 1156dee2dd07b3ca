//! Simulation loop runner with operator controls.
//!
//! This module provides [`run_simulation`], the top-level async function
//! that drives the tick loop with support for:
//!
//! - **Start/stop**: the loop idles while stopped, still applying late
//!   collaborator answers
//! - **Reset and reconfigure**: the session is rebuilt between ticks under
//!   a new epoch, so every in-flight answer becomes stale
//! - **Variable tick speed**: tick interval adjustable at runtime
//! - **Bounded runs**: stop after `max_ticks`
//! - **Clean shutdown**: operator-requested exit
//!
//! Collaborator requests staged by a tick are executed on spawned tasks.
//! Their answers travel back over a channel and are applied between ticks,
//! so simulation state is only ever mutated by this loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::collaborator::CollaboratorResponse;
use crate::context::SimulationContext;
use crate::operator::{OperatorState, ResetRequest, SimulationEndReason};
use crate::reasoner::{Reasoner, answer};
use crate::responses::{ResponseOutcome, apply_response};
use crate::tick::{self, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed in the final session.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed across all sessions.
    pub total_ticks: u64,
}

/// Callback invoked as the simulation changes.
///
/// Implementations can use this to update the observer snapshot,
/// broadcast tick summaries, etc.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, ctx: &SimulationContext);

    /// Called when state changed outside a tick: after a reset, or after
    /// collaborator answers were applied while stopped.
    fn on_refresh(&mut self, _ctx: &SimulationContext) {}
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _ctx: &SimulationContext) {}
}

/// Run the simulation loop until shutdown or the tick limit.
///
/// # Arguments
///
/// * `ctx` - Mutable session state
/// * `reasoner` - The reasoning collaborator (LLM backend or fallback)
/// * `operator` - Shared operator control state
/// * `callback` - Called after each tick for observer updates
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub async fn run_simulation(
    ctx: &mut SimulationContext,
    reasoner: &Arc<dyn Reasoner>,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let (tx, mut rx) = mpsc::unbounded_channel::<CollaboratorResponse>();
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = operator.max_ticks(),
        tick_interval_ms = operator.tick_interval_ms(),
        running = operator.is_running(),
        reasoner = reasoner.name(),
        epoch = %ctx.epoch,
        "Simulation loop starting"
    );

    loop {
        // --- Check shutdown ---
        if operator.is_shutdown_requested() {
            info!("Operator shutdown requested");
            let reason = SimulationEndReason::OperatorShutdown;
            operator.set_end_reason(reason.clone()).await;
            return Ok(SimulationResult {
                end_reason: reason,
                final_summary: last_summary,
                total_ticks,
            });
        }

        // --- Reset / reconfigure between ticks ---
        if let Some(request) = operator.take_reset().await {
            if apply_reset(ctx, request) {
                last_summary = None;
            }
            callback.on_refresh(ctx);
            continue;
        }

        // --- Stopped: wait, but keep applying late answers ---
        if !operator.is_running() {
            tokio::select! {
                () = operator.wait_until_needed() => {}
                Some(response) = rx.recv() => {
                    apply_one(ctx, response);
                    drain_responses(ctx, &mut rx);
                    callback.on_refresh(ctx);
                }
            }
            continue;
        }

        // --- Apply answers that arrived since the last tick ---
        drain_responses(ctx, &mut rx);

        // --- Execute tick ---
        let summary = tick::advance(ctx)?;
        total_ticks = total_ticks.saturating_add(1);

        // --- Issue collaborator requests ---
        spawn_requests(ctx, reasoner, &tx);

        // --- Notify callback ---
        callback.on_tick(&summary, ctx);

        // --- Check tick limit (after tick) ---
        if operator.tick_limit_reached(summary.tick) {
            info!(
                tick = summary.tick,
                max_ticks = operator.max_ticks(),
                "Tick limit reached"
            );
            let reason = SimulationEndReason::MaxTicksReached;
            operator.set_end_reason(reason.clone()).await;
            return Ok(SimulationResult {
                end_reason: reason,
                final_summary: Some(summary),
                total_ticks,
            });
        }

        last_summary = Some(summary);

        // --- Sleep for tick interval ---
        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        }
    }
}

/// Rebuild the session. A failed rebuild keeps the current session.
fn apply_reset(ctx: &mut SimulationContext, request: ResetRequest) -> bool {
    let config = match request {
        ResetRequest::Restart => ctx.config.clone(),
        ResetRequest::Reconfigure(config) => *config,
    };
    let previous = ctx.epoch;
    match ctx.reset(config) {
        Ok(()) => {
            info!(previous = %previous, epoch = %ctx.epoch, "Session reset");
            true
        }
        Err(error) => {
            warn!(%error, "Session reset failed, keeping the current session");
            false
        }
    }
}

fn apply_one(ctx: &mut SimulationContext, response: CollaboratorResponse) {
    let kind = match &response {
        CollaboratorResponse::Goal { .. } => "goal",
        CollaboratorResponse::Trade { .. } => "trade",
        CollaboratorResponse::Invention { .. } => "invention",
    };
    let outcome = apply_response(ctx, response);
    if outcome != ResponseOutcome::Applied {
        debug!(kind, outcome = ?outcome, "collaborator response not applied");
    }
}

fn drain_responses(ctx: &mut SimulationContext, rx: &mut UnboundedReceiver<CollaboratorResponse>) {
    while let Ok(response) = rx.try_recv() {
        apply_one(ctx, response);
    }
}

fn spawn_requests(
    ctx: &mut SimulationContext,
    reasoner: &Arc<dyn Reasoner>,
    tx: &UnboundedSender<CollaboratorResponse>,
) {
    let timeout = Duration::from_millis(ctx.config.reasoner.timeout_ms);
    for request in ctx.drain_requests() {
        let reasoner = Arc::clone(reasoner);
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = answer(reasoner.as_ref(), request, timeout).await;
            if tx.send(response).is_err() {
                debug!("run loop has exited, dropping collaborator response");
            }
        });
    }
}

/// Log the simulation end sequence.
///
/// This should be called after [`run_simulation`] returns. The HTTP server
/// should remain running after this returns.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            time = %summary.time_label,
            season = ?summary.season,
            queue_len = summary.queue_len,
            "Final tick summary"
        );
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}
