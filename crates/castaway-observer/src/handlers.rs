//! Read-only REST handlers.
//!
//! All handlers read from the in-memory [`SimulationSnapshot`] via the
//! shared [`AppState`], so a request never touches the live session.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/world` | Clock, epoch and counts |
//! | `GET` | `/api/actors` | Actor summaries |
//! | `GET` | `/api/actors/{id}` | One actor with its queued events |
//! | `GET` | `/api/objects` | Placed objects (`?kind=tree`) |
//! | `GET` | `/api/trades` | Negotiations (`?status=negotiating`) |
//! | `GET` | `/api/inventions` | Discovered inventions |
//! | `GET` | `/api/log` | Event log, newest first (`?actor=`, `?kind=`, `?limit=`) |
//! | `GET` | `/api/island` | Land grid |
//!
//! [`SimulationSnapshot`]: crate::state::SimulationSnapshot

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use castaway_types::{ActorId, LogKind};
use uuid::Uuid;

use crate::error::ObserverError;
use crate::state::AppState;

/// Default number of log entries returned.
const DEFAULT_LOG_LIMIT: usize = 100;

/// Upper bound on log entries returned.
const MAX_LOG_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/objects`.
#[derive(Debug, serde::Deserialize)]
pub struct ObjectsQuery {
    /// Object kind, case-insensitive (`tree`, `rock`, `water`, `shelter`).
    pub kind: Option<String>,
}

/// Query parameters for `GET /api/trades`.
#[derive(Debug, serde::Deserialize)]
pub struct TradesQuery {
    /// Trade status, case-insensitive (`negotiating`, `fulfilled`, ...).
    pub status: Option<String>,
}

/// Query parameters for `GET /api/log`.
#[derive(Debug, serde::Deserialize)]
pub struct LogQuery {
    /// Only entries about this actor (UUID).
    pub actor: Option<String>,
    /// Only entries of this kind (`system`, `info`, `action`, `trade`).
    pub kind: Option<LogKind>,
    /// Maximum number of entries (default 100, max 1000).
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the clock and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    let time = snapshot.time_label.clone();
    let season = format!("{:?}", snapshot.season);
    let actor_count = snapshot.actors.len();
    let object_count = snapshot.objects.len();
    let trade_count = snapshot.trades.len();
    let running = state
        .operator_state
        .as_ref()
        .is_some_and(|operator| operator.is_running());
    let status = if running { "RUNNING" } else { "STOPPED" };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Castaway Observer</title>
    <style>
        body {{ background: #0d1117; color: #c9d1d9; font-family: monospace; padding: 2rem; max-width: 800px; margin: 0 auto; }}
        h1 {{ color: #58a6ff; }}
        .metric {{ display: inline-block; background: #161b22; border: 1px solid #30363d; border-radius: 6px; padding: 1rem 1.5rem; margin: 0.5rem 0.5rem 0.5rem 0; }}
        .label {{ color: #8b949e; font-size: 0.85rem; }}
        .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; }}
    </style>
</head>
<body>
    <h1>Castaway Observer</h1>
    <p>Status: <strong>{status}</strong></p>
    <div>
        <div class="metric"><div class="label">Time</div><div class="value">{time}</div></div>
        <div class="metric"><div class="label">Season</div><div class="value">{season}</div></div>
        <div class="metric"><div class="label">Actors</div><div class="value">{actor_count}</div></div>
        <div class="metric"><div class="label">Objects</div><div class="value">{object_count}</div></div>
        <div class="metric"><div class="label">Trades</div><div class="value">{trade_count}</div></div>
    </div>
    <h2>API</h2>
    <ul>
        <li><a href="/api/world">/api/world</a></li>
        <li><a href="/api/actors">/api/actors</a></li>
        <li><a href="/api/objects">/api/objects</a></li>
        <li><a href="/api/trades">/api/trades</a></li>
        <li><a href="/api/inventions">/api/inventions</a></li>
        <li><a href="/api/log">/api/log</a></li>
        <li><a href="/api/island">/api/island</a></li>
        <li><a href="/api/operator/status">/api/operator/status</a></li>
        <li><code>ws://host:port/ws/ticks</code></li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/world
// ---------------------------------------------------------------------------

/// Return the clock, session epoch, run state and record counts.
pub async fn get_world(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    let running = state
        .operator_state
        .as_ref()
        .is_some_and(|operator| operator.is_running());

    Json(serde_json::json!({
        "epoch": snapshot.epoch,
        "tick": snapshot.tick,
        "time_label": snapshot.time_label,
        "season": snapshot.season,
        "running": running,
        "actors_count": snapshot.actors.len(),
        "objects_count": snapshot.objects.len(),
        "trades_count": snapshot.trades.len(),
        "inventions_count": snapshot.inventions.len(),
        "queue_len": snapshot.queue.len(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/actors
// ---------------------------------------------------------------------------

/// List actors with their position, vitals, current action and goal.
pub async fn list_actors(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;

    let actors: Vec<serde_json::Value> = snapshot
        .actors
        .values()
        .map(|actor| {
            serde_json::json!({
                "id": actor.id,
                "name": actor.name,
                "position": actor.position,
                "vitals": actor.vitals,
                "action": actor.action.label(),
                "goal": actor.goal,
                "housing": actor.long_term_memory.housing,
                "tools": actor.long_term_memory.tools,
                "inventory": actor.inventory,
            })
        })
        .collect();

    Json(serde_json::json!({
        "count": actors.len(),
        "actors": actors,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/actors/{id}
// ---------------------------------------------------------------------------

/// Return one actor's full record and the queue events it owns.
pub async fn get_actor(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let actor_id = ActorId::from(parse_uuid(&id_str)?);
    let snapshot = state.snapshot.read().await;

    let actor = snapshot
        .actors
        .get(&actor_id)
        .ok_or_else(|| ObserverError::NotFound(format!("actor {actor_id}")))?;

    let queued: Vec<_> = snapshot
        .queue
        .iter()
        .filter(|event| event.actor == actor_id)
        .map(|event| &event.kind)
        .collect();

    Ok(Json(serde_json::json!({
        "actor": actor,
        "queued": queued,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/objects
// ---------------------------------------------------------------------------

/// List placed objects, optionally filtered by kind.
pub async fn list_objects(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ObjectsQuery>,
) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;

    let objects: Vec<_> = snapshot
        .objects
        .iter()
        .filter(|object| {
            params
                .kind
                .as_deref()
                .is_none_or(|kind| format!("{:?}", object.kind).eq_ignore_ascii_case(kind))
        })
        .collect();

    Json(serde_json::json!({
        "count": objects.len(),
        "objects": objects,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/trades
// ---------------------------------------------------------------------------

/// List negotiations, optionally filtered by status.
pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TradesQuery>,
) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;

    let trades: Vec<_> = snapshot
        .trades
        .values()
        .filter(|trade| {
            params
                .status
                .as_deref()
                .is_none_or(|status| trade.status.to_string().eq_ignore_ascii_case(status))
        })
        .collect();

    Json(serde_json::json!({
        "count": trades.len(),
        "trades": trades,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/inventions
// ---------------------------------------------------------------------------

/// List discovered inventions.
pub async fn list_inventions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    let inventions: Vec<_> = snapshot.inventions.values().collect();

    Json(serde_json::json!({
        "count": inventions.len(),
        "inventions": inventions,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/log
// ---------------------------------------------------------------------------

/// Return event log entries, newest first.
pub async fn list_log(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .min(MAX_LOG_LIMIT);
    let actor_filter = params
        .actor
        .as_deref()
        .map(parse_uuid)
        .transpose()?
        .map(ActorId::from);

    let snapshot = state.snapshot.read().await;

    let entries: Vec<_> = snapshot
        .log
        .iter()
        .rev()
        .filter(|entry| actor_filter.is_none_or(|id| entry.actor == Some(id)))
        .filter(|entry| params.kind.is_none_or(|kind| entry.kind == kind))
        .take(limit)
        .collect();

    Ok(Json(serde_json::json!({
        "count": entries.len(),
        "entries": entries,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/island
// ---------------------------------------------------------------------------

/// Return the land grid as rows of booleans (`true` is land).
pub async fn get_island(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let snapshot = state.snapshot.read().await;
    let island = snapshot
        .island
        .as_ref()
        .ok_or_else(|| ObserverError::NotFound(String::from("no island generated yet")))?;

    Ok(Json(serde_json::json!({
        "width": island.width(),
        "height": island.height(),
        "land_tiles": island.land_count(),
        "rows": island.rows(),
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a UUID from a string, returning an [`ObserverError`] on failure.
fn parse_uuid(s: &str) -> Result<Uuid, ObserverError> {
    s.parse::<Uuid>()
        .map_err(|e| ObserverError::InvalidUuid(format!("{s}: {e}")))
}
