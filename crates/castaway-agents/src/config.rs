//! Tunables for actor mechanics.
//!
//! These structs are embedded as sections of the simulation configuration
//! (`vitals`, `timings`, `costs` in `castaway-config.yaml`). Every field has
//! a default so partial files deserialize cleanly.

use std::collections::BTreeMap;

use castaway_types::Resource;
use serde::{Deserialize, Serialize};

/// Vital-stat bounds, decay, restoration and critical thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsConfig {
    /// Energy cap (default: 100).
    pub max_energy: f64,
    /// Hunger (satiety) cap (default: 100).
    pub max_hunger: f64,
    /// Energy lost per tick while awake (default: 0.7).
    pub energy_decay_rate: f64,
    /// Hunger lost per tick while awake (default: 0.5).
    pub hunger_decay_rate: f64,
    /// Energy restored per tick of sleep (default: 7).
    pub energy_per_sleep_tick: f64,
    /// Hunger restored by one coconut (default: 30).
    pub hunger_per_coconut: f64,
    /// Hunger restored by one fish (default: 50).
    pub hunger_per_fish: f64,
    /// Sleep speed-up and restore bonus in one's own shelter (default: 1.5).
    pub sleep_in_shelter_multiplier: f64,
    /// Hunger below which a plan is interrupted (default: 25).
    pub critical_hunger: f64,
    /// Energy below which a plan is interrupted (default: 20).
    pub critical_energy: f64,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            max_energy: 100.0,
            max_hunger: 100.0,
            energy_decay_rate: 0.7,
            hunger_decay_rate: 0.5,
            energy_per_sleep_tick: 7.0,
            hunger_per_coconut: 30.0,
            hunger_per_fish: 50.0,
            sleep_in_shelter_multiplier: 1.5,
            critical_hunger: 25.0,
            critical_energy: 20.0,
        }
    }
}

impl VitalsConfig {
    /// Hunger restored by eating one unit of `food`; zero for non-food.
    pub const fn hunger_restored_by(&self, food: Resource) -> f64 {
        match food {
            Resource::Coconut => self.hunger_per_coconut,
            Resource::Fish => self.hunger_per_fish,
            Resource::Wood | Resource::Stone | Resource::Axe | Resource::Shelter => 0.0,
        }
    }
}

/// Base durations, in ticks, for each action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionTimings {
    /// Ticks to walk the full map width (default: 5).
    #[serde(rename = "move")]
    pub move_ticks: u32,
    /// Ticks per gather cycle before modifiers (default: 10).
    pub gather: u32,
    /// Ticks to eat (default: 2).
    pub consume: u32,
    /// Ticks to sleep outside a shelter (default: 10).
    pub sleep: u32,
    /// Ticks to build a shelter or an invention (default: 20).
    pub build: u32,
    /// Ticks to craft an axe (default: 5).
    pub craft: u32,
    /// Ticks an actor waits for a goal decision (default: 10).
    pub thinking: u32,
}

impl Default for ActionTimings {
    fn default() -> Self {
        Self {
            move_ticks: 5,
            gather: 10,
            consume: 2,
            sleep: 10,
            build: 20,
            craft: 5,
            thinking: 10,
        }
    }
}

/// Resource costs of the two fixed constructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraftingCosts {
    /// Cost of a shelter (default: 10 Wood, 5 Stone).
    pub shelter: BTreeMap<Resource, u32>,
    /// Cost of an axe (default: 5 Wood, 2 Stone).
    pub axe: BTreeMap<Resource, u32>,
}

impl Default for CraftingCosts {
    fn default() -> Self {
        Self {
            shelter: BTreeMap::from([(Resource::Wood, 10), (Resource::Stone, 5)]),
            axe: BTreeMap::from([(Resource::Wood, 5), (Resource::Stone, 2)]),
        }
    }
}
