//! Aggregated invention effects for one actor.
//!
//! An actor may own several inventions touching the same resource or stat.
//! Multipliers compound; flat yield bonuses add.

use std::collections::BTreeMap;

use castaway_types::{Actor, Invention, InventionEffect, InventionId, Resource, VitalStat};

/// The combined effect of every invention an actor owns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventionEffects {
    productivity: BTreeMap<Resource, f64>,
    decay: BTreeMap<VitalStat, f64>,
    yield_bonus: BTreeMap<Resource, u32>,
}

impl InventionEffects {
    /// Fold the effects of `actor`'s inventions.
    ///
    /// Ids missing from `registry` are ignored.
    pub fn for_actor(actor: &Actor, registry: &BTreeMap<InventionId, Invention>) -> Self {
        let mut effects = Self::default();
        for invention in actor.inventions.iter().filter_map(|id| registry.get(id)) {
            match invention.effect {
                InventionEffect::ProductivityBoost {
                    resource,
                    multiplier,
                } => {
                    *effects.productivity.entry(resource).or_insert(1.0) *= multiplier;
                }
                InventionEffect::StatDecayModifier { stat, multiplier } => {
                    *effects.decay.entry(stat).or_insert(1.0) *= multiplier;
                }
                InventionEffect::GatherYieldBonus { resource, bonus } => {
                    let entry = effects.yield_bonus.entry(resource).or_insert(0);
                    *entry = entry.saturating_add(bonus);
                }
            }
        }
        effects
    }

    /// Compound productivity multiplier for `resource` (1.0 when none).
    pub fn productivity_multiplier(&self, resource: Resource) -> f64 {
        self.productivity.get(&resource).copied().unwrap_or(1.0)
    }

    /// Compound decay multiplier for `stat` (1.0 when none).
    pub fn decay_multiplier(&self, stat: VitalStat) -> f64 {
        self.decay.get(&stat).copied().unwrap_or(1.0)
    }

    /// Extra units per completed gather of `resource`.
    pub fn yield_bonus(&self, resource: Resource) -> u32 {
        self.yield_bonus.get(&resource).copied().unwrap_or(0)
    }
}
