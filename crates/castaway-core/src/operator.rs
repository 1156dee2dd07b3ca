//! Operator control state for runtime simulation management.
//!
//! This module provides shared state used by the run loop and the control
//! surface. The operator can start and stop the clock, change tick speed,
//! reset the session (optionally with a new configuration), and trigger a
//! clean shutdown, all without restarting the process.
//!
//! # Architecture
//!
//! Hot-path flags are atomics so the run loop reads them without locking.
//! Requests that carry data (a new configuration, the end reason) sit
//! behind a [`tokio::sync::Mutex`]. A single [`Notify`] wakes the run loop
//! while it waits in the stopped state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::{MIN_TICK_INTERVAL_MS, SimulationConfig};

/// Reason why the run loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// An operator requested shutdown.
    OperatorShutdown,
}

/// A pending request to rebuild the session.
#[derive(Debug, Clone)]
pub enum ResetRequest {
    /// Start over with the current configuration.
    Restart,
    /// Start over with a new configuration.
    Reconfigure(Box<SimulationConfig>),
}

/// Shared operator control state.
///
/// Wrapped in an `Arc` and shared between the run loop and the control
/// surface handlers.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether the clock is running.
    running: AtomicBool,

    /// Wakes the run loop while stopped.
    wake: Notify,

    /// Whether shutdown has been requested.
    shutdown_requested: AtomicBool,

    /// Current tick interval in milliseconds (runtime-adjustable).
    tick_interval_ms: AtomicU64,

    /// Maximum number of ticks per session (0 = unlimited).
    max_ticks: AtomicU64,

    /// Wall-clock time the process started.
    started_at: DateTime<Utc>,

    /// Whether `reset` holds a request.
    reset_pending: AtomicBool,

    /// The latest reset request.
    reset: Mutex<Option<ResetRequest>>,

    /// Reason the run loop ended, if it has.
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Create operator state. The clock starts stopped unless `running`.
    pub fn new(tick_interval_ms: u64, max_ticks: u64, running: bool) -> Self {
        Self {
            running: AtomicBool::new(running),
            wake: Notify::new(),
            shutdown_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms.max(MIN_TICK_INTERVAL_MS)),
            max_ticks: AtomicU64::new(max_ticks),
            started_at: Utc::now(),
            reset_pending: AtomicBool::new(false),
            reset: Mutex::new(None),
            end_reason: Mutex::new(None),
        }
    }

    /// Create operator state from a configuration.
    pub fn from_config(config: &SimulationConfig, running: bool) -> Self {
        Self::new(
            config.simulation.tick_interval_ms,
            config.simulation.max_ticks,
            running,
        )
    }

    // -----------------------------------------------------------------------
    // Start / Stop
    // -----------------------------------------------------------------------

    /// Check whether the clock is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start the clock and wake the run loop.
    pub fn start(&self) {
        self.running.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Stop the clock. In-flight collaborator calls still land.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Wait until the clock runs or a reset or shutdown needs handling.
    pub async fn wait_until_needed(&self) {
        while !self.is_running() && !self.has_pending_control() {
            self.wake.notified().await;
        }
    }

    fn has_pending_control(&self) -> bool {
        self.reset_pending.load(Ordering::Acquire) || self.is_shutdown_requested()
    }

    // -----------------------------------------------------------------------
    // Reset / Reconfigure
    // -----------------------------------------------------------------------

    /// Ask for the session to be rebuilt with the current configuration.
    pub async fn request_reset(&self) {
        self.submit_reset(ResetRequest::Restart).await;
    }

    /// Ask for the session to be rebuilt with `config`.
    ///
    /// The tick interval and tick limit take effect immediately.
    pub async fn request_reconfigure(&self, config: SimulationConfig) {
        self.set_tick_interval_ms(config.simulation.tick_interval_ms);
        self.max_ticks
            .store(config.simulation.max_ticks, Ordering::Release);
        self.submit_reset(ResetRequest::Reconfigure(Box::new(config)))
            .await;
    }

    async fn submit_reset(&self, request: ResetRequest) {
        let mut guard = self.reset.lock().await;
        *guard = Some(request);
        self.reset_pending.store(true, Ordering::Release);
        drop(guard);
        self.wake.notify_one();
    }

    /// Take the pending reset request, if any.
    pub async fn take_reset(&self) -> Option<ResetRequest> {
        if !self.reset_pending.load(Ordering::Acquire) {
            return None;
        }
        let mut guard = self.reset.lock().await;
        self.reset_pending.store(false, Ordering::Release);
        guard.take()
    }

    // -----------------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------------

    /// Request that the run loop exit.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Check whether shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Record the reason the run loop ended.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// Get the reason the run loop ended, if it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        self.end_reason.lock().await.clone()
    }

    // -----------------------------------------------------------------------
    // Tick Speed
    // -----------------------------------------------------------------------

    /// Get the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Set the tick interval in milliseconds.
    ///
    /// Returns the previous interval, or `None` if the value was rejected
    /// (below [`MIN_TICK_INTERVAL_MS`]).
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        Some(self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Check whether the tick limit has been reached.
    ///
    /// Returns `true` if `max_ticks > 0` and `current_tick >= max_ticks`.
    pub fn tick_limit_reached(&self, current_tick: u64) -> bool {
        let max = self.max_ticks();
        max > 0 && current_tick >= max
    }

    /// Get the configured max ticks.
    pub fn max_ticks(&self) -> u64 {
        self.max_ticks.load(Ordering::Acquire)
    }

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}

/// JSON-serializable status of the simulation for the control surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationStatus {
    /// Current tick number.
    pub tick: u64,
    /// Session epoch.
    pub epoch: String,
    /// Whether the clock is running.
    pub running: bool,
    /// Whether shutdown has been requested.
    pub shutdown_requested: bool,
    /// Current tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Elapsed wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// Configured maximum ticks (0 = unlimited).
    pub max_ticks: u64,
    /// The reason the run loop ended, if applicable.
    pub end_reason: Option<SimulationEndReason>,
    /// ISO 8601 timestamp of when the process started.
    pub started_at: String,
}
