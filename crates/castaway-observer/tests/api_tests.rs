//! Integration tests for the Observer API endpoints.
//!
//! Tests drive the `Router` directly via `tower::ServiceExt` without
//! starting a TCP server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use castaway_core::operator::{OperatorState, ResetRequest};
use castaway_core::{SimulationConfig, SimulationContext};
use castaway_observer::router::build_router;
use castaway_observer::state::{AppState, SimulationSnapshot};
use castaway_types::{ActorId, LogKind};
use serde_json::Value;
use tower::ServiceExt;

fn context() -> SimulationContext {
    let mut config = SimulationConfig::default();
    config.simulation.seed = Some(3);
    let mut ctx = SimulationContext::new(config).unwrap();
    let first = *ctx.actors.keys().next().unwrap();
    ctx.note(LogKind::Info, Some(first), "Caught a fish.");
    ctx.note(LogKind::System, None, "A new tree has grown on the island.");
    ctx
}

async fn make_state(operator: Option<Arc<OperatorState>>) -> (Arc<AppState>, SimulationContext) {
    let state = operator.map_or_else(AppState::new, AppState::with_operator);
    let ctx = context();
    *state.snapshot.write().await = SimulationSnapshot::capture(&ctx);
    (Arc::new(state), ctx)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(state: Arc<AppState>, path: &str) -> (StatusCode, Value) {
    let response = build_router(state)
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn post(state: Arc<AppState>, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::post(path).header("content-type", "application/json");
    let request = match body {
        Some(json) => request.body(Body::from(json.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = build_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn operator() -> Arc<OperatorState> {
    Arc::new(OperatorState::new(500, 0, false))
}

// =========================================================================
// Read-only routes
// =========================================================================

#[tokio::test]
async fn index_returns_html() {
    let (state, _) = make_state(None).await;
    let response = build_router(state)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn world_reports_clock_and_epoch() {
    let (state, ctx) = make_state(Some(operator())).await;
    let (status, json) = get(state, "/api/world").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tick"], 0);
    assert_eq!(json["epoch"], ctx.epoch.to_string());
    assert_eq!(json["time_label"], ctx.clock.label());
    assert_eq!(json["running"], false);
    assert_eq!(json["actors_count"], 2);
}

#[tokio::test]
async fn list_actors() {
    let (state, _) = make_state(None).await;
    let (status, json) = get(state, "/api/actors").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    let names: Vec<&str> = json["actors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Robinson"));
    assert!(names.contains(&"Friday"));
}

#[tokio::test]
async fn get_actor_by_id() {
    let (state, ctx) = make_state(None).await;
    let actor = ctx.actors.values().next().unwrap();
    let path = format!("/api/actors/{}", actor.id);
    let (status, json) = get(state, &path).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["actor"]["name"], actor.name.as_str());
    assert!(json["queued"].is_array());
}

#[tokio::test]
async fn get_actor_not_found() {
    let (state, _) = make_state(None).await;
    let path = format!("/api/actors/{}", ActorId::new());
    let (status, json) = get(state, &path).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn get_actor_invalid_uuid() {
    let (state, _) = make_state(None).await;
    let (status, _) = get(state, "/api/actors/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn objects_filter_by_kind() {
    let (state, ctx) = make_state(None).await;
    let (status, all) = get(Arc::clone(&state), "/api/objects").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["count"], ctx.objects.len());

    let (_, trees) = get(state, "/api/objects?kind=tree").await;
    let expected = ctx
        .objects
        .iter()
        .filter(|o| o.kind == castaway_types::ObjectKind::Tree)
        .count();
    assert_eq!(trees["count"], expected);
}

#[tokio::test]
async fn trades_and_inventions_start_empty() {
    let (state, _) = make_state(None).await;
    let (status, trades) = get(Arc::clone(&state), "/api/trades?status=negotiating").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trades["count"], 0);

    let (status, inventions) = get(state, "/api/inventions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inventions["count"], 0);
}

#[tokio::test]
async fn log_is_newest_first_and_filterable() {
    let (state, ctx) = make_state(None).await;
    let (status, json) = get(Arc::clone(&state), "/api/log").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], ctx.log.len());
    assert_eq!(
        json["entries"][0]["message"],
        "A new tree has grown on the island."
    );

    let (_, system) = get(Arc::clone(&state), "/api/log?kind=system&limit=1").await;
    assert_eq!(system["count"], 1);

    let first = ctx.actors.keys().next().unwrap();
    let (_, mine) = get(state, &format!("/api/log?actor={first}")).await;
    assert!(
        mine["entries"]
            .as_array()
            .unwrap()
            .iter()
            .all(|e| e["actor"] == first.to_string())
    );
}

#[tokio::test]
async fn island_reports_grid() {
    let (state, ctx) = make_state(None).await;
    let (status, json) = get(state, "/api/island").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["width"], ctx.island.width());
    assert_eq!(json["rows"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn island_missing_before_first_snapshot() {
    let state = Arc::new(AppState::new());
    let (status, _) = get(state, "/api/island").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn nonexistent_route_returns_404() {
    let (state, _) = make_state(None).await;
    let response = build_router(state)
        .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =========================================================================
// Operator routes
// =========================================================================

#[tokio::test]
async fn start_and_stop_toggle_the_clock() {
    let operator = operator();
    let (state, _) = make_state(Some(Arc::clone(&operator))).await;

    let (status, json) = post(Arc::clone(&state), "/api/operator/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert!(operator.is_running());

    let (status, _) = post(state, "/api/operator/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!operator.is_running());
}

#[tokio::test]
async fn reset_queues_a_restart() {
    let operator = operator();
    let (state, _) = make_state(Some(Arc::clone(&operator))).await;

    let (status, _) = post(state, "/api/operator/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(matches!(
        operator.take_reset().await,
        Some(ResetRequest::Restart)
    ));
}

#[tokio::test]
async fn speed_rejects_too_fast_intervals() {
    let operator = operator();
    let (state, _) = make_state(Some(Arc::clone(&operator))).await;

    let (status, json) = post(
        Arc::clone(&state),
        "/api/operator/speed",
        Some(serde_json::json!({ "tick_interval_ms": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["previous_interval_ms"], 500);
    assert_eq!(operator.tick_interval_ms(), 50);

    let (status, _) = post(
        state,
        "/api/operator/speed",
        Some(serde_json::json!({ "tick_interval_ms": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(operator.tick_interval_ms(), 50);
}

#[tokio::test]
async fn config_queues_a_reconfigure() {
    let operator = operator();
    let (state, _) = make_state(Some(Arc::clone(&operator))).await;

    let body = serde_json::json!({
        "simulation": { "tick_interval_ms": 100, "max_ticks": 48 },
        "map": { "width": 12, "height": 12 },
    });
    let (status, _) = post(state, "/api/operator/config", Some(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(operator.tick_interval_ms(), 100);
    assert_eq!(operator.max_ticks(), 48);
    let request = operator.take_reset().await;
    assert!(matches!(
        request,
        Some(ResetRequest::Reconfigure(ref config)) if config.map.width == 12
    ));
}

#[tokio::test]
async fn config_rejects_invalid_values() {
    let operator = operator();
    let (state, _) = make_state(Some(Arc::clone(&operator))).await;

    let body = serde_json::json!({ "map": { "width": 0 } });
    let (status, _) = post(state, "/api/operator/config", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(operator.take_reset().await.is_none());
}

#[tokio::test]
async fn shutdown_sets_the_flag() {
    let operator = operator();
    let (state, _) = make_state(Some(Arc::clone(&operator))).await;

    let (status, _) = post(state, "/api/operator/shutdown", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(operator.is_shutdown_requested());
}

#[tokio::test]
async fn status_reports_operator_state() {
    let (state, ctx) = make_state(Some(operator())).await;
    let (status, json) = get(state, "/api/operator/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["running"], false);
    assert_eq!(json["tick_interval_ms"], 500);
    assert_eq!(json["epoch"], ctx.epoch.to_string());
    assert!(json["end_reason"].is_null());
}

#[tokio::test]
async fn control_without_run_loop_is_unavailable() {
    let (state, _) = make_state(None).await;
    let (status, _) = post(state, "/api/operator/start", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
