//! Engine binary for the Castaway simulation.
//!
//! Wires the run loop, the reasoning collaborator and the observer server
//! together.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `castaway-config.yaml` (or `CASTAWAY_CONFIG`)
//! 3. Build the starting session
//! 4. Select the collaborator: the LLM when `LLM_*` variables are set,
//!    otherwise the deterministic fallback
//! 5. Create operator state and start the observer server
//! 6. Run the simulation loop
//! 7. Keep serving the final state until Ctrl-C when the tick limit ended
//!    the run

mod error;
mod observer_callback;

use std::path::PathBuf;
use std::sync::Arc;

use castaway_core::config::SimulationConfig;
use castaway_core::runner;
use castaway_core::{
    FallbackReasoner, OperatorState, Reasoner, SimulationContext, SimulationEndReason,
};
use castaway_observer::{AppState, ServerConfig, SimulationSnapshot};
use castaway_oracle::{LlmReasoner, OracleConfig, OracleError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::observer_callback::ObserverCallback;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "castaway-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the run loop fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("castaway-engine starting");

    // 2. Load configuration.
    let config = load_config(std::env::var("CASTAWAY_CONFIG").ok())?;
    info!(
        seed = ?config.simulation.seed,
        tick_interval_ms = config.simulation.tick_interval_ms,
        max_ticks = config.simulation.max_ticks,
        width = config.map.width,
        height = config.map.height,
        "Configuration loaded"
    );

    // 3. Build the starting session.
    let mut ctx = SimulationContext::new(config.clone())?;
    info!(
        epoch = %ctx.epoch,
        actors = ctx.actors.len(),
        objects = ctx.objects.len(),
        land_tiles = ctx.island.land_count(),
        "Session created"
    );

    // 4. Select the collaborator.
    let reasoner = select_reasoner(OracleConfig::from_env(&config.reasoner.model));

    // 5. Operator state and observer server.
    let autostart = env_flag(std::env::var("CASTAWAY_AUTOSTART").ok().as_deref());
    let operator = Arc::new(OperatorState::from_config(&config, autostart));
    let app_state = Arc::new(AppState::with_operator(Arc::clone(&operator)));
    app_state.try_publish(SimulationSnapshot::capture(&ctx));

    let server_config = observer_config(
        std::env::var("CASTAWAY_OBSERVER_HOST").ok(),
        std::env::var("CASTAWAY_OBSERVER_PORT").ok().as_deref(),
    )?;
    let _observer_handle = castaway_observer::spawn_observer(server_config, Arc::clone(&app_state))?;
    if !autostart {
        info!("Clock stopped; POST /api/operator/start to begin");
    }

    // 6. Run the simulation.
    let mut callback = ObserverCallback::new(app_state);
    let result = runner::run_simulation(&mut ctx, &reasoner, &operator, &mut callback).await?;
    runner::log_simulation_end(&result);

    // 7. Keep the observer up after a bounded run.
    if result.end_reason == SimulationEndReason::MaxTicksReached {
        info!("Serving final state; press Ctrl-C to exit");
        tokio::signal::ctrl_c().await?;
    }

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "castaway-engine shutdown complete"
    );
    Ok(())
}

/// Load the simulation configuration.
///
/// An explicit path must exist; the default path falls back to built-in
/// defaults when absent.
fn load_config(explicit: Option<String>) -> Result<SimulationConfig, EngineError> {
    if let Some(path) = explicit {
        info!(%path, "Loading configuration");
        return Ok(SimulationConfig::from_file(&PathBuf::from(path))?);
    }
    let path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if path.exists() {
        Ok(SimulationConfig::from_file(&path)?)
    } else {
        info!("Config file not found, using defaults");
        Ok(SimulationConfig::default())
    }
}

/// Pick the LLM collaborator when it is configured and its templates load,
/// otherwise the deterministic fallback.
fn select_reasoner(oracle: Result<OracleConfig, OracleError>) -> Arc<dyn Reasoner> {
    let built = oracle.and_then(|config| {
        let reasoner = LlmReasoner::new(&config)?;
        info!(
            backend = reasoner.backend_name(),
            model = %config.backend.model,
            templates = %config.templates_dir,
            "LLM collaborator enabled"
        );
        Ok(reasoner)
    });
    match built {
        Ok(reasoner) => Arc::new(reasoner),
        Err(e) => {
            warn!(error = %e, "LLM collaborator unavailable, running with AI disabled");
            Arc::new(FallbackReasoner)
        }
    }
}

/// Build the observer bind address from optional overrides.
fn observer_config(host: Option<String>, port: Option<&str>) -> Result<ServerConfig, EngineError> {
    let defaults = ServerConfig::default();
    let port = port
        .map(str::parse::<u16>)
        .transpose()
        .map_err(|e| EngineError::Env {
            name: "CASTAWAY_OBSERVER_PORT",
            message: e.to_string(),
        })?
        .unwrap_or(defaults.port);
    Ok(ServerConfig {
        host: host.unwrap_or(defaults.host),
        port,
    })
}

/// Interpret a boolean environment flag (`1`, `true`, `yes`, `on`).
fn env_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}
