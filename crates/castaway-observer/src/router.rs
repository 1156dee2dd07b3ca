//! Axum router construction for the Observer API.
//!
//! Assembles the read-only REST routes, the `WebSocket` stream and the
//! operator control routes into one [`Router`] with permissive CORS so a
//! browser client on another origin can connect.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::operator;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let control = Router::new()
        .route("/start", post(operator::start))
        .route("/stop", post(operator::stop))
        .route("/reset", post(operator::reset))
        .route("/speed", post(operator::set_speed))
        .route("/config", post(operator::set_config))
        .route("/shutdown", post(operator::shutdown))
        .route("/status", get(operator::status));

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/ticks", get(ws::ws_ticks))
        .route("/api/world", get(handlers::get_world))
        .route("/api/actors", get(handlers::list_actors))
        .route("/api/actors/{id}", get(handlers::get_actor))
        .route("/api/objects", get(handlers::list_objects))
        .route("/api/trades", get(handlers::list_trades))
        .route("/api/inventions", get(handlers::list_inventions))
        .route("/api/log", get(handlers::list_log))
        .route("/api/island", get(handlers::get_island))
        .nest("/api/operator", control)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
