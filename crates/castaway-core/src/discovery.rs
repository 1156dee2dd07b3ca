//! Invention discovery.
//!
//! Every tick each idle actor without an idea in flight rolls against
//! `world.invention_chance`. A hit picks a category uniformly and asks the
//! collaborator to flesh it out. The in-flight guard is released when the
//! answer comes back, whether or not it produced an invention.

use std::collections::BTreeSet;

use castaway_types::{ActorId, Invention, InventionCategory, InventionId, LogKind};
use rand::Rng;
use tracing::{debug, info};

use crate::collaborator::InventionDraft;
use crate::context::SimulationContext;

/// Roll for new ideas. Returns how many requests were staged.
pub(crate) fn roll(ctx: &mut SimulationContext) -> usize {
    let chance = ctx.config.world.invention_chance;
    let candidates: Vec<ActorId> = ctx
        .actors
        .values()
        .filter(|a| a.is_idle() && !ctx.is_discovering(a.id))
        .map(|a| a.id)
        .collect();

    let mut staged: usize = 0;
    for id in candidates {
        if ctx.rng.random::<f64>() >= chance {
            continue;
        }
        let pick = ctx.rng.random_range(0..InventionCategory::ALL.len());
        let Some(category) = InventionCategory::ALL.get(pick).copied() else {
            continue;
        };
        if ctx.request_invention(id, category) {
            debug!(actor = %id, category = category.label(), "invention idea requested");
            staged = staged.saturating_add(1);
        }
    }
    staged
}

/// Register the outcome of an idea request and release the guard.
pub(crate) fn apply(
    ctx: &mut SimulationContext,
    inventor: ActorId,
    category: InventionCategory,
    draft: Option<Box<InventionDraft>>,
) -> Option<InventionId> {
    ctx.finish_discovery(inventor);
    let Some(draft) = draft else {
        debug!(actor = %inventor, category = category.label(), "invention idea came to nothing");
        return None;
    };
    let InventionDraft { spec, icon } = *draft;
    let invention = Invention {
        id: InventionId::new(),
        name: spec.name,
        description: spec.description,
        category,
        cost: spec.cost,
        effect: spec.effect,
        icon,
        owners: BTreeSet::new(),
    };
    let id = invention.id;
    let name = ctx.name_of(inventor);
    ctx.note(
        LogKind::System,
        Some(inventor),
        format!("{name} had an idea for a new invention: {}!", invention.name),
    );
    ctx.remember(inventor, format!("I came up with the idea for the {}.", invention.name));
    info!(invention = %id, name = %invention.name, inventor = %inventor, "Invention discovered");
    ctx.inventions.insert(id, invention);
    Some(id)
}
