//! Configuration loading and typed config structures for the Castaway simulation.
//!
//! The canonical configuration lives in `castaway-config.yaml` at the project
//! root. Every section carries `#[serde(default)]`, so a partial file (or no
//! file at all) yields a complete configuration. The actor-facing sections
//! (`vitals`, `timings`, `costs`) are defined in `castaway-agents` and
//! embedded here unchanged.

use std::path::Path;

use castaway_agents::{ActionTimings, CraftingCosts, VitalsConfig};
use castaway_world::StartingObjects;
use serde::{Deserialize, Serialize};

/// Smallest tick interval the run loop accepts, in milliseconds.
pub const MIN_TICK_INTERVAL_MS: u64 = 10;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `castaway-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Run-loop settings (cadence, seed, limits).
    #[serde(default)]
    pub simulation: SimulationSettings,

    /// Island dimensions and land ratio.
    #[serde(default)]
    pub map: MapConfig,

    /// Vital-stat tunables.
    #[serde(default)]
    pub vitals: VitalsConfig,

    /// Base action durations.
    #[serde(default)]
    pub timings: ActionTimings,

    /// Axe and shelter costs.
    #[serde(default)]
    pub costs: CraftingCosts,

    /// World events, depletion and starting objects.
    #[serde(default)]
    pub world: WorldConfig,

    /// Negotiation limits.
    #[serde(default)]
    pub trade: TradeConfig,

    /// Reasoning collaborator call settings.
    #[serde(default)]
    pub reasoner: ReasonerConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values a session cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.map.width == 0 || self.map.height == 0 {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "map must be at least 1x1 (got {}x{})",
                    self.map.width, self.map.height
                ),
            });
        }
        if !(self.map.land_ratio > 0.0 && self.map.land_ratio <= 1.0) {
            return Err(ConfigError::Invalid {
                reason: format!("land_ratio must be in (0, 1] (got {})", self.map.land_ratio),
            });
        }
        if self.simulation.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS} (got {})",
                    self.simulation.tick_interval_ms
                ),
            });
        }
        if self.world.tree_wood_depletion_limit == 0 {
            return Err(ConfigError::Invalid {
                reason: "tree_wood_depletion_limit must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Run-loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// RNG seed; a random seed is drawn when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Most queue events the dispatcher handles in one pass.
    #[serde(default = "default_dispatch_budget")]
    pub dispatch_budget: u32,

    /// Stop after this many ticks (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Event-log entries retained.
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    /// Short-term memory notes retained per actor.
    #[serde(default = "default_short_term_memory")]
    pub short_term_memory: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            seed: None,
            dispatch_budget: default_dispatch_budget(),
            max_ticks: 0,
            log_capacity: default_log_capacity(),
            short_term_memory: default_short_term_memory(),
        }
    }
}

/// Island dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Columns.
    #[serde(default = "default_map_side")]
    pub width: u32,

    /// Rows.
    #[serde(default = "default_map_side")]
    pub height: u32,

    /// Initial land probability per cell before smoothing.
    #[serde(default = "default_land_ratio")]
    pub land_ratio: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: default_map_side(),
            height: default_map_side(),
            land_ratio: default_land_ratio(),
        }
    }
}

/// World events, tool wear, depletion and starting objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Axe durability lost per wood gather (default: 2).
    pub axe_depreciation_rate: u32,
    /// Wood a tree yields before it is removed (default: 10).
    pub tree_wood_depletion_limit: u32,
    /// Ticks between new trees (default: 2400).
    pub tree_regrowth_ticks: u64,
    /// Daily chance each shelter is destroyed (default: 0.01).
    pub shelter_catastrophe_chance: f64,
    /// Per-tick chance an idle actor has an invention idea (default: 0.005).
    pub invention_chance: f64,
    /// Trees placed at session start (default: 4).
    pub initial_trees: u32,
    /// Rocks placed at session start (default: 2).
    pub initial_rocks: u32,
    /// Water sources placed at session start (default: 4).
    pub initial_water: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            axe_depreciation_rate: 2,
            tree_wood_depletion_limit: 10,
            tree_regrowth_ticks: 2400,
            shelter_catastrophe_chance: 0.01,
            invention_chance: 0.005,
            initial_trees: 4,
            initial_rocks: 2,
            initial_water: 4,
        }
    }
}

impl WorldConfig {
    /// The starting object counts.
    pub const fn starting_objects(&self) -> StartingObjects {
        StartingObjects {
            trees: self.initial_trees,
            rocks: self.initial_rocks,
            water: self.initial_water,
        }
    }
}

/// Negotiation limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeConfig {
    /// Ticks both parties wait after a negotiation ends (default: 24).
    pub cooldown_ticks: u32,
    /// Highest turn at which a counter-offer is still allowed (default: 4).
    pub max_negotiation_turns: u32,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            cooldown_ticks: 24,
            max_negotiation_turns: 4,
        }
    }
}

/// Reasoning collaborator call settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Model name passed to the backend.
    pub model: String,
    /// Temperature for goal and trade decisions (default: 0.7).
    pub temperature: f64,
    /// Temperature for invention specifications (default: 0.9).
    pub invention_temperature: f64,
    /// Temperature for icon drawing (default: 0.2).
    pub icon_temperature: f64,
    /// Upper bound on one collaborator call (default: 30000).
    pub timeout_ms: u64,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            model: String::from("gemini-2.5-flash"),
            temperature: 0.7,
            invention_temperature: 0.9,
            icon_temperature: 0.2,
            timeout_ms: 30_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    500
}

const fn default_dispatch_budget() -> u32 {
    8
}

const fn default_log_capacity() -> usize {
    100
}

const fn default_short_term_memory() -> usize {
    10
}

const fn default_map_side() -> u32 {
    20
}

const fn default_land_ratio() -> f64 {
    0.5
}
