//! Vital mechanics applied to actors each tick.
//!
//! - Energy and hunger decay every tick unless the actor is asleep
//! - Owned stat-decay inventions scale the decay rate
//! - Sleep restores energy and food restores hunger, capped at the maximum
//! - Hunger below 25 or energy below 20 is critical and interrupts plans
//!
//! Values never leave `[0, max]`.

use castaway_types::{ActionState, Actor, VitalStat, Vitals};

use crate::config::VitalsConfig;
use crate::effects::InventionEffects;

/// Which vital pushed an actor into the critical zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriticalVital {
    /// Hunger below the critical threshold.
    Starvation,
    /// Energy below the critical threshold.
    Exhaustion,
}

impl CriticalVital {
    /// The danger the actor is avoiding ("starvation", "exhaustion").
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Starvation => "starvation",
            Self::Exhaustion => "exhaustion",
        }
    }
}

/// Whether the actor's vitals are critical. Hunger is checked first.
pub fn critical(vitals: &Vitals, config: &VitalsConfig) -> Option<CriticalVital> {
    if vitals.hunger < config.critical_hunger {
        Some(CriticalVital::Starvation)
    } else if vitals.energy < config.critical_energy {
        Some(CriticalVital::Exhaustion)
    } else {
        None
    }
}

/// Apply one tick of decay. Sleeping actors do not decay.
pub fn decay(actor: &mut Actor, config: &VitalsConfig, effects: &InventionEffects) {
    if matches!(actor.action, ActionState::Sleeping { .. }) {
        return;
    }
    let energy_loss = config.energy_decay_rate * effects.decay_multiplier(VitalStat::Energy);
    let hunger_loss = config.hunger_decay_rate * effects.decay_multiplier(VitalStat::Hunger);
    actor.vitals.energy = (actor.vitals.energy - energy_loss).max(0.0);
    actor.vitals.hunger = (actor.vitals.hunger - hunger_loss).max(0.0);
}

/// Add `amount` energy, capped at the configured maximum.
pub fn restore_energy(vitals: &mut Vitals, amount: f64, config: &VitalsConfig) {
    vitals.energy = (vitals.energy + amount).min(config.max_energy);
}

/// Add `amount` hunger (satiety), capped at the configured maximum.
pub fn restore_hunger(vitals: &mut Vitals, amount: f64, config: &VitalsConfig) {
    vitals.hunger = (vitals.hunger + amount).min(config.max_hunger);
}
