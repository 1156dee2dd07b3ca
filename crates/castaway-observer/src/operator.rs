//! Operator REST handlers for runtime control.
//!
//! Every request only flips shared [`OperatorState`]; the run loop acts on
//! it between ticks, so no handler ever mutates the session directly.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/operator/start` | Start the clock |
//! | `POST` | `/api/operator/stop` | Stop the clock |
//! | `POST` | `/api/operator/reset` | Rebuild the session with the current config |
//! | `POST` | `/api/operator/speed` | Set the tick interval (ms) |
//! | `POST` | `/api/operator/config` | Replace the config and rebuild the session |
//! | `POST` | `/api/operator/shutdown` | End the run loop |
//! | `GET` | `/api/operator/status` | Current control status |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use castaway_core::config::MIN_TICK_INTERVAL_MS;
use castaway_core::operator::{OperatorState, SimulationStatus};
use castaway_core::SimulationConfig;
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;

/// Request body for `POST /api/operator/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SetSpeedRequest {
    /// New tick interval in milliseconds.
    pub tick_interval_ms: u64,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    ok: bool,
    message: String,
}

impl OperatorResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            ok: true,
            message: message.into(),
        })
    }
}

fn operator(state: &AppState) -> Result<&Arc<OperatorState>, ObserverError> {
    state
        .operator_state
        .as_ref()
        .ok_or(ObserverError::ControlUnavailable)
}

/// Start (or resume) the clock.
pub async fn start(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.start();
    info!("Operator started the clock");
    Ok(OperatorResponse::ok("Simulation running"))
}

/// Stop the clock. Collaborator answers already in flight still land.
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.stop();
    info!("Operator stopped the clock");
    Ok(OperatorResponse::ok("Simulation stopped"))
}

/// Rebuild the session with the current configuration.
///
/// Takes effect between ticks; answers to earlier requests become stale.
pub async fn reset(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.request_reset().await;
    info!("Operator requested a reset");
    Ok(OperatorResponse::ok("Reset queued"))
}

/// Change the tick interval at runtime.
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetSpeedRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let previous = operator(&state)?
        .set_tick_interval_ms(body.tick_interval_ms)
        .ok_or_else(|| {
            ObserverError::InvalidRequest(format!(
                "tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}"
            ))
        })?;

    info!(previous, current = body.tick_interval_ms, "Operator changed tick interval");
    Ok(Json(serde_json::json!({
        "ok": true,
        "message": format!("Tick interval changed from {previous}ms to {}ms", body.tick_interval_ms),
        "previous_interval_ms": previous,
        "new_interval_ms": body.tick_interval_ms,
    })))
}

/// Replace the configuration and rebuild the session with it.
///
/// The body is a full or partial configuration; omitted sections take
/// their defaults.
pub async fn set_config(
    State(state): State<Arc<AppState>>,
    Json(config): Json<SimulationConfig>,
) -> Result<impl IntoResponse, ObserverError> {
    let operator = operator(&state)?;
    config
        .validate()
        .map_err(|e| ObserverError::InvalidRequest(e.to_string()))?;
    operator.request_reconfigure(config).await;
    info!("Operator submitted a new configuration");
    Ok(OperatorResponse::ok("Configuration accepted, reset queued"))
}

/// End the run loop. The HTTP server keeps serving the last snapshot.
pub async fn shutdown(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.request_shutdown();
    info!("Operator requested shutdown");
    Ok(OperatorResponse::ok("Shutdown requested"))
}

/// Return run state, speed, limits and the current tick.
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let operator = operator(&state)?;
    let (tick, epoch) = {
        let snapshot = state.snapshot.read().await;
        (
            snapshot.tick,
            snapshot.epoch.map(|e| e.to_string()).unwrap_or_default(),
        )
    };

    Ok(Json(SimulationStatus {
        tick,
        epoch,
        running: operator.is_running(),
        shutdown_requested: operator.is_shutdown_requested(),
        tick_interval_ms: operator.tick_interval_ms(),
        elapsed_seconds: operator.elapsed_seconds(),
        max_ticks: operator.max_ticks(),
        end_reason: operator.end_reason().await,
        started_at: operator.started_at().to_rfc3339(),
    }))
}
