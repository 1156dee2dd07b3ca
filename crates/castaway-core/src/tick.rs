//! Tick cycle: one simulated hour.
//!
//! Each call to [`advance`] runs these phases in order:
//!
//! 1. **Clock** -- advance one hour and recompute the season.
//! 2. **Interrupt** -- actors with critical vitals and a plan that does not
//!    address the danger drop their plan and go idle.
//! 3. **Progress** -- every other actor decays, counts down its trade
//!    cooldown and advances its action; finished actions apply their effect
//!    and either chain a follow-up or advance the plan.
//! 4. **Ideas** -- idle actors roll for an invention.
//! 5. **Dispatch** -- interrupted actors get a decide-goal at the front of
//!    the queue, then the dispatcher runs once.
//! 6. **World** -- day-boundary shelter catastrophes and tree regrowth.
//! 7. **Idle check** -- idle actors with nothing queued get their next plan
//!    step (with preconditions resolved) or a decide-goal.
//!
//! Collaborator requests staged during the tick stay in the context outbox
//! for the run loop to execute.

use std::collections::BTreeSet;

use castaway_agents::vitals::{self, CriticalVital};
use castaway_agents::{
    AxeWear, DurationInputs, InventionEffects, action_duration, crafting, gather_yield, inventory,
    memory,
};
use castaway_types::{
    ActionState, Actor, ActorId, Event, EventKind, HousingStatus, LogKind, Position, Resource,
    Season, ToolStatus,
};
use castaway_world::WoodExtraction;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::ClockError;
use crate::context::SimulationContext;
use crate::{discovery, dispatcher, negotiation};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// An action that finished this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedAction {
    /// Who finished it.
    pub actor: ActorId,
    /// The action's display label.
    pub action: String,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Serialize)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// "Day N, HH:00".
    pub time_label: String,
    /// The season during this tick.
    pub season: Season,
    /// Actors whose plans were interrupted by critical vitals.
    pub interrupted: Vec<ActorId>,
    /// Actions that completed.
    pub completed: Vec<CompletedAction>,
    /// Queue heads handled by the dispatcher.
    pub events_handled: u32,
    /// Invention ideas requested.
    pub ideas: usize,
    /// Shelters lost to catastrophes.
    pub shelters_destroyed: usize,
    /// Trees that grew back.
    pub trees_grown: usize,
    /// Events left in the queue.
    pub queue_len: usize,
    /// Collaborator requests waiting to be executed.
    pub requests: usize,
}

/// Run one tick against `ctx`.
///
/// Precondition failures and missing references never fail the tick; they
/// become log entries and re-planning. Only clock overflow is an error.
pub fn advance(ctx: &mut SimulationContext) -> Result<TickSummary, TickError> {
    let tick = ctx.clock.advance()?;
    let season = ctx.clock.season();
    info!(tick, season = ?season, "Tick started");

    let interrupted = interrupt_critical(ctx);
    let completed = progress(ctx, &interrupted);
    let ideas = discovery::roll(ctx);

    for id in &interrupted {
        negotiation::abort_queued(ctx, *id, "Negotiation interrupted by critical vitals.");
        ctx.queue.remove_actor(*id);
        ctx.queue.queue_decide(*id, true);
    }
    let events_handled = dispatcher::process(ctx);

    let shelters_destroyed = catastrophes(ctx);
    let trees_grown = regrowth(ctx);

    schedule_idle(ctx);

    let summary = TickSummary {
        tick,
        time_label: ctx.clock.label(),
        season,
        interrupted,
        completed,
        events_handled,
        ideas,
        shelters_destroyed,
        trees_grown,
        queue_len: ctx.queue.len(),
        requests: ctx.pending_requests(),
    };
    debug!(
        tick,
        completed = summary.completed.len(),
        events_handled,
        queue_len = summary.queue_len,
        requests = summary.requests,
        "Tick complete"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Phase 2: critical interruption
// ---------------------------------------------------------------------------

/// Whether `plan` already contains a step that relieves `danger`.
fn plan_addresses(actor: &Actor, danger: CriticalVital) -> bool {
    actor.plan.iter().any(|step| match (danger, step) {
        (
            CriticalVital::Starvation,
            EventKind::Consume { resource } | EventKind::Gather { resource, .. },
        ) => resource.is_food(),
        (CriticalVital::Exhaustion, EventKind::Sleep) => true,
        _ => false,
    })
}

fn interrupt_critical(ctx: &mut SimulationContext) -> Vec<ActorId> {
    let endangered: Vec<(ActorId, CriticalVital)> = ctx
        .actors
        .values()
        .filter(|a| !a.plan.is_empty())
        .filter_map(|a| {
            vitals::critical(&a.vitals, &ctx.config.vitals)
                .filter(|danger| !plan_addresses(a, *danger))
                .map(|danger| (a.id, danger))
        })
        .collect();

    let capacity = ctx.memory_capacity();
    let mut interrupted = Vec::with_capacity(endangered.len());
    for (id, danger) in endangered {
        negotiation::release(ctx, id, None, "Negotiation interrupted by critical vitals.");
        ctx.cancel_goal(id);
        let Some(actor) = ctx.actors.get_mut(&id) else {
            continue;
        };
        actor.plan.clear();
        actor.action = ActionState::Idle;
        actor.action_progress = 0;
        memory::remember(
            actor,
            format!(
                "My vitals are critical! I must abandon my plan to avoid {}.",
                danger.reason()
            ),
            capacity,
        );
        let name = actor.name.clone();
        ctx.note(
            LogKind::System,
            Some(id),
            format!("{name}'s vitals are critical! Their plan has been interrupted."),
        );
        warn!(actor = %id, reason = danger.reason(), "Plan interrupted");
        interrupted.push(id);
    }
    interrupted
}

// ---------------------------------------------------------------------------
// Phase 3: decay and action progress
// ---------------------------------------------------------------------------

fn progress(ctx: &mut SimulationContext, interrupted: &[ActorId]) -> Vec<CompletedAction> {
    let ids: Vec<ActorId> = ctx.actors.keys().copied().collect();
    let mut completed = Vec::new();
    for id in ids {
        if interrupted.contains(&id) {
            continue;
        }
        let Some(effects) = ctx.actors.get(&id).map(|a| ctx.effects_for(a)) else {
            continue;
        };
        let inputs = DurationInputs {
            timings: &ctx.config.timings,
            vitals: &ctx.config.vitals,
            map_width: ctx.config.map.width,
        };
        let Some(actor) = ctx.actors.get_mut(&id) else {
            continue;
        };
        vitals::decay(actor, &ctx.config.vitals, &effects);
        actor.trade_cooldown = actor.trade_cooldown.saturating_sub(1);
        if actor.is_idle() || actor.action.awaits_negotiation() {
            continue;
        }
        actor.action_progress = actor.action_progress.saturating_add(1);
        let duration = action_duration(actor, &inputs, &effects);
        if actor.action_progress < duration {
            continue;
        }
        if let Some(done) = complete(ctx, id, duration, &effects) {
            completed.push(done);
        }
    }
    completed
}

/// Finish `id`'s current action and apply its effect.
fn complete(
    ctx: &mut SimulationContext,
    id: ActorId,
    duration: u32,
    effects: &InventionEffects,
) -> Option<CompletedAction> {
    let mut actor = ctx.actors.remove(&id)?;
    let action = std::mem::take(&mut actor.action);
    actor.action_progress = 0;
    let label = action.label();
    let thinking = matches!(action, ActionState::Thinking);

    finish(ctx, &mut actor, action, duration, effects);

    if !thinking {
        actor.last_completed_action = Some(label.clone());
    }
    ctx.actors.insert(id, actor);
    debug!(actor = %id, action = %label, "Action complete");
    Some(CompletedAction { actor: id, action: label })
}

/// Apply the effect of a finished action. `actor` is detached from the
/// context for the duration of the call.
#[allow(clippy::too_many_lines)]
fn finish(
    ctx: &mut SimulationContext,
    actor: &mut Actor,
    action: ActionState,
    duration: u32,
    effects: &InventionEffects,
) {
    let capacity = ctx.memory_capacity();
    let name = actor.name.clone();
    let id = actor.id;

    match action {
        ActionState::Thinking => {}
        ActionState::Moving { destination, then } => {
            arrive(ctx, actor, destination);
            if let Some(next) = then {
                ctx.queue.queue(*next, true);
            }
        }
        ActionState::MovingToTrade {
            trade,
            destination,
            then,
        } => {
            arrive(ctx, actor, destination);
            actor.action = ActionState::AwaitingTradeResponse { trade };
            ctx.queue.queue(*then, true);
        }
        ActionState::Gathering {
            resource,
            source,
            target_amount,
            gathered,
        } => {
            let amount = gather_yield(actor, resource, effects);
            if let Err(err) = inventory::add_resource(&mut actor.inventory, resource, amount) {
                warn!(actor = %id, error = %err, "Gathered goods could not be stored");
            }
            memory::remember(actor, format!("Gathered {amount} {resource}."), capacity);

            if resource == Resource::Wood {
                if crafting::wear_axe(actor, ctx.config.world.axe_depreciation_rate) == AxeWear::Broke {
                    ctx.note(LogKind::System, Some(id), format!("{name}'s axe broke!"));
                    memory::remember_tools(actor, "My axe broke!", ToolStatus::NoTools, capacity);
                }
                let limit = ctx.config.world.tree_wood_depletion_limit;
                match ctx.objects.extract_wood(source, amount, limit) {
                    Ok(WoodExtraction::Depleted) => {
                        ctx.note(LogKind::Info, None, "A tree has been depleted and removed.");
                    }
                    Ok(WoodExtraction::Standing(_)) => {}
                    Err(err) => debug!(actor = %id, error = %err, "tree vanished during gathering"),
                }
            }

            let total = gathered.saturating_add(amount);
            if target_amount.is_some_and(|target| total < target) {
                if let Some(EventKind::Gather { gathered, .. }) = actor.plan.front_mut() {
                    *gathered = total;
                }
                ctx.queue.queue(
                    Event::new(
                        id,
                        EventKind::Gather {
                            resource,
                            source: Some(source),
                            target_amount,
                            gathered: total,
                        },
                    ),
                    true,
                );
            } else {
                actor.plan.pop_front();
            }
        }
        ActionState::Sleeping { at_shelter } => {
            let cfg = &ctx.config.vitals;
            let multiplier = if at_shelter {
                cfg.sleep_in_shelter_multiplier
            } else {
                1.0
            };
            let gained = f64::from(duration) * cfg.energy_per_sleep_tick * multiplier;
            vitals::restore_energy(&mut actor.vitals, gained, cfg);
            ctx.note(
                LogKind::Info,
                Some(id),
                format!("{name} woke up feeling refreshed."),
            );
            memory::remember(actor, format!("Slept and restored {gained:.1} energy."), capacity);
            actor.plan.pop_front();
        }
        ActionState::Eating { resource } => {
            if inventory::remove_resource(&mut actor.inventory, resource, 1).is_ok() {
                let restored = ctx.config.vitals.hunger_restored_by(resource);
                vitals::restore_hunger(&mut actor.vitals, restored, &ctx.config.vitals);
                ctx.note(
                    LogKind::Info,
                    Some(id),
                    format!("{name} finished eating a {resource}."),
                );
                memory::remember(
                    actor,
                    format!("Ate a {resource}, restoring {restored} hunger."),
                    capacity,
                );
            } else {
                ctx.note(
                    LogKind::Info,
                    Some(id),
                    format!("{name} had no {resource} left to eat."),
                );
            }
            actor.plan.pop_front();
        }
        ActionState::CraftingAxe => {
            if crafting::craft_axe(actor, &ctx.config.costs).is_ok() {
                ctx.note(
                    LogKind::System,
                    Some(id),
                    format!("{name} successfully crafted an axe!"),
                );
                memory::remember_tools(actor, "I crafted a new axe.", ToolStatus::HasAxe, capacity);
            } else {
                ctx.note(
                    LogKind::Info,
                    Some(id),
                    format!("{name} ran out of materials before the axe was finished."),
                );
            }
            actor.plan.pop_front();
        }
        ActionState::BuildingShelter => {
            if crafting::pay_for_shelter(actor, &ctx.config.costs).is_ok() {
                ctx.objects.place_shelter(id, actor.position);
                ctx.note(
                    LogKind::System,
                    Some(id),
                    format!("{name} finished building a shelter!"),
                );
                memory::remember_housing(
                    actor,
                    "I built a new shelter.",
                    HousingStatus::HasShelter,
                    capacity,
                );
            } else {
                ctx.note(
                    LogKind::Info,
                    Some(id),
                    format!("{name} ran out of materials before the shelter was finished."),
                );
            }
            actor.plan.pop_front();
        }
        ActionState::BuildingInvention { invention } => {
            match ctx.inventions.get_mut(&invention) {
                Some(known) if inventory::debit(&mut actor.inventory, &known.cost).is_ok() => {
                    known.owners.insert(id);
                    actor.inventions.insert(invention);
                    let title = known.name.clone();
                    ctx.note(
                        LogKind::System,
                        Some(id),
                        format!("{name} finished building {title}!"),
                    );
                    memory::remember(actor, format!("I built the {title}."), capacity);
                }
                _ => ctx.note(
                    LogKind::Info,
                    Some(id),
                    format!("{name} could not finish the invention."),
                ),
            }
            actor.plan.pop_front();
        }
        ActionState::Idle
        | ActionState::Negotiating { .. }
        | ActionState::AwaitingTradeResponse { .. } => {}
    }
}

fn arrive(ctx: &mut SimulationContext, actor: &mut Actor, destination: Position) {
    actor.position = destination;
    let name = actor.name.clone();
    ctx.note(
        LogKind::Info,
        Some(actor.id),
        format!("{name} arrived at destination."),
    );
    memory::remember(
        actor,
        format!("Arrived at position {destination}."),
        ctx.memory_capacity(),
    );
}

// ---------------------------------------------------------------------------
// Phase 6: world events
// ---------------------------------------------------------------------------

fn catastrophes(ctx: &mut SimulationContext) -> usize {
    if !ctx.clock.is_new_day() {
        return 0;
    }
    let chance = ctx.config.world.shelter_catastrophe_chance;
    let capacity = ctx.memory_capacity();
    let mut destroyed: usize = 0;
    for (shelter, owner) in ctx.objects.shelters() {
        if ctx.rng.random::<f64>() >= chance {
            continue;
        }
        ctx.objects.remove(shelter);
        destroyed = destroyed.saturating_add(1);
        let name = ctx.name_of(owner);
        ctx.note(
            LogKind::System,
            Some(owner),
            format!("A natural catastrophe has destroyed {name}'s shelter!"),
        );
        if let Some(actor) = ctx.actors.get_mut(&owner) {
            memory::remember_housing(
                actor,
                "My shelter was destroyed by a catastrophe!",
                HousingStatus::Unhoused,
                capacity,
            );
        }
        info!(owner = %owner, "Shelter destroyed");
    }
    destroyed
}

fn regrowth(ctx: &mut SimulationContext) -> usize {
    if !ctx.clock.every(ctx.config.world.tree_regrowth_ticks) {
        return 0;
    }
    let grown = ctx
        .objects
        .spawn_tree(&ctx.island, &BTreeSet::new(), &mut ctx.rng);
    match grown {
        Some(tree) => {
            ctx.note(LogKind::Info, None, "A new tree has grown on the island.");
            debug!(object = %tree, "tree regrown");
            1
        }
        None => 0,
    }
}

// ---------------------------------------------------------------------------
// Phase 7: idle check
// ---------------------------------------------------------------------------

fn schedule_idle(ctx: &mut SimulationContext) {
    let ids: Vec<ActorId> = ctx.actors.keys().copied().collect();
    for id in ids {
        let next_step = match ctx.actors.get(&id) {
            Some(actor)
                if actor.is_idle()
                    && !ctx.queue.has_event_for(id)
                    && !ctx.goal_outstanding(id) =>
            {
                actor.plan.front().cloned()
            }
            _ => continue,
        };
        match next_step {
            None => {
                ctx.queue.queue_decide(id, false);
            }
            Some(step) => {
                let event = dispatcher::resolve_step(ctx, id, step);
                ctx.queue.queue(event, true);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use castaway_types::{ObjectKind, Position, TradeStatus};
    use castaway_world::new_object;

    use super::*;
    use crate::context::tests::{id_of, small_context};

    #[test]
    fn critical_hunger_interrupts_plan_and_replans_first() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        let friday = id_of(&ctx, "Friday");
        {
            let actor = ctx.actors.get_mut(&robinson).unwrap();
            actor.vitals.hunger = 20.0;
            actor.plan.push_back(EventKind::BuildShelter);
            actor.action = ActionState::CraftingAxe;
        }
        ctx.queue.queue(Event::new(friday, EventKind::Sleep), false);
        ctx.queue.queue(Event::new(robinson, EventKind::CraftAxe), false);

        let summary = advance(&mut ctx).unwrap();

        assert_eq!(summary.interrupted, vec![robinson]);
        let actor = ctx.actors.get(&robinson).unwrap();
        assert!(actor.plan.is_empty());
        assert_eq!(actor.action, ActionState::Thinking);
        assert!(actor
            .short_term_memory
            .front()
            .unwrap()
            .contains("avoid starvation"));
        assert!(!ctx.queue.iter().any(|e| e.actor == robinson));
        assert!(ctx.log.contains("Robinson's vitals are critical!"));
    }

    #[test]
    fn food_plan_is_not_interrupted() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        {
            let actor = ctx.actors.get_mut(&robinson).unwrap();
            actor.vitals.hunger = 20.0;
            actor.plan.push_back(EventKind::Consume {
                resource: Resource::Coconut,
            });
            actor.inventory = BTreeMap::from([(Resource::Coconut, 1)]);
            actor.action = ActionState::Eating {
                resource: Resource::Coconut,
            };
        }
        let summary = advance(&mut ctx).unwrap();
        assert!(summary.interrupted.is_empty());
    }

    #[test]
    fn worn_axe_breaks_on_wood_gather() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        let tree = ctx.objects.insert(new_object(ObjectKind::Tree, Position::new(1, 1)));
        {
            let actor = ctx.actors.get_mut(&robinson).unwrap();
            actor.tools.insert(Resource::Axe, 2);
            actor.long_term_memory.tools = ToolStatus::HasAxe;
            actor.plan.push_back(EventKind::Gather {
                resource: Resource::Wood,
                source: None,
                target_amount: None,
                gathered: 0,
            });
            actor.action = ActionState::Gathering {
                resource: Resource::Wood,
                source: tree,
                target_amount: None,
                gathered: 0,
            };
            actor.action_progress = 100;
        }
        let summary = advance(&mut ctx).unwrap();

        assert_eq!(summary.completed.len(), 1);
        let actor = ctx.actors.get(&robinson).unwrap();
        assert!(!actor.tools.contains_key(&Resource::Axe));
        assert_eq!(actor.long_term_memory.tools, ToolStatus::NoTools);
        assert!(actor.holding(Resource::Wood) > 0);
        assert!(actor.plan.is_empty());
        assert!(ctx.log.contains("Robinson's axe broke!"));
    }

    #[test]
    fn exhausted_tree_is_removed() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        let mut tree = new_object(ObjectKind::Tree, Position::new(1, 1));
        tree.wood_extracted = 9;
        let tree = ctx.objects.insert(tree);
        {
            let actor = ctx.actors.get_mut(&robinson).unwrap();
            actor.tools.insert(Resource::Axe, 100);
            actor.productivity.insert(Resource::Wood, 1.0);
            actor.action = ActionState::Gathering {
                resource: Resource::Wood,
                source: tree,
                target_amount: None,
                gathered: 0,
            };
            actor.action_progress = 100;
        }
        advance(&mut ctx).unwrap();
        assert!(ctx.objects.get(tree).is_none());
        assert_eq!(ctx.actors.get(&robinson).unwrap().holding(Resource::Wood), 3);
        assert!(ctx.log.contains("A tree has been depleted and removed."));
    }

    #[test]
    fn partial_gather_requeues_same_source() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        let rock = ctx.objects.insert(new_object(ObjectKind::Rock, Position::new(1, 1)));
        {
            let actor = ctx.actors.get_mut(&robinson).unwrap();
            actor.productivity.insert(Resource::Stone, 1.0);
            actor.plan.push_back(EventKind::Gather {
                resource: Resource::Stone,
                source: None,
                target_amount: Some(3),
                gathered: 0,
            });
            actor.action = ActionState::Gathering {
                resource: Resource::Stone,
                source: rock,
                target_amount: Some(3),
                gathered: 0,
            };
            actor.action_progress = 100;
        }
        advance(&mut ctx).unwrap();
        let actor = ctx.actors.get(&robinson).unwrap();
        assert_eq!(actor.plan.len(), 1);
        assert!(matches!(
            actor.action,
            ActionState::Gathering { gathered: 1, source, .. } if source == rock
        ));
    }

    #[test]
    fn arrival_runs_deferred_step() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        ctx.actors.get_mut(&robinson).unwrap().action = ActionState::Moving {
            destination: Position::new(2, 1),
            then: Some(Box::new(Event::new(robinson, EventKind::Sleep))),
        };
        ctx.actors.get_mut(&robinson).unwrap().action_progress = 100;
        advance(&mut ctx).unwrap();
        let actor = ctx.actors.get(&robinson).unwrap();
        assert_eq!(actor.position, Position::new(2, 1));
        assert!(matches!(actor.action, ActionState::Sleeping { .. }));
    }

    #[test]
    fn idle_actors_get_one_decide_each() {
        let mut ctx = small_context();
        for _ in 0..5 {
            advance(&mut ctx).unwrap();
            for id in ctx.actors.keys() {
                assert!(ctx.queue.decide_count(*id) <= 1);
            }
        }
        assert_eq!(ctx.drain_requests().len(), 2);
    }

    #[test]
    fn walking_initiator_abandons_trade_when_interrupted() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        let friday = id_of(&ctx, "Friday");
        let terms = castaway_types::TradeTerms {
            give: Resource::Wood,
            give_amount: 1,
            take: Resource::Coconut,
            take_amount: 1,
        };
        ctx.actors.get_mut(&robinson).unwrap().plan.push_back(EventKind::TradeInitiate {
            partner: friday,
            terms,
        });
        ctx.actors.get_mut(&robinson).unwrap().plan.push_back(EventKind::Idle);
        ctx.queue.queue(
            Event::new(robinson, EventKind::TradeInitiate { partner: friday, terms }),
            false,
        );
        dispatcher::process(&mut ctx);
        ctx.actors.get_mut(&robinson).unwrap().vitals.energy = 5.0;

        advance(&mut ctx).unwrap();
        let trade = ctx.trades.values().next().unwrap();
        assert_eq!(trade.status, TradeStatus::Failed);
        assert!(ctx.actors.get(&robinson).unwrap().trade_cooldown > 0);
    }

    #[test]
    fn interrupted_recipient_calls_off_arriving_trade() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        let friday = id_of(&ctx, "Friday");
        let terms = castaway_types::TradeTerms {
            give: Resource::Wood,
            give_amount: 5,
            take: Resource::Stone,
            take_amount: 3,
        };
        let trade = castaway_types::Trade::open(robinson, friday, terms);
        let trade_id = trade.id;
        let offer = trade.latest_offer().cloned().unwrap();
        ctx.trades.insert(trade_id, trade);
        {
            let actor = ctx.actors.get_mut(&robinson).unwrap();
            actor.action = ActionState::MovingToTrade {
                trade: trade_id,
                destination: Position::new(5, 5),
                then: Box::new(Event::new(
                    friday,
                    EventKind::TradeNegotiate {
                        trade: trade_id,
                        offer,
                    },
                )),
            };
            actor.action_progress = 100;
        }
        {
            let actor = ctx.actors.get_mut(&friday).unwrap();
            actor.vitals.hunger = 20.0;
            actor.plan.push_back(EventKind::BuildShelter);
        }

        let summary = advance(&mut ctx).unwrap();

        assert_eq!(summary.interrupted, vec![friday]);
        assert_eq!(ctx.trades.get(&trade_id).unwrap().status, TradeStatus::Failed);
        let initiator = ctx.actors.get(&robinson).unwrap();
        assert_eq!(initiator.position, Position::new(5, 5));
        assert!(!matches!(
            initiator.action,
            ActionState::AwaitingTradeResponse { .. }
        ));
        assert!(initiator.trade_cooldown > 0);
        assert!(ctx.queue.has_decide_for(robinson));
        assert!(
            !ctx.queue
                .iter()
                .any(|e| matches!(e.kind, EventKind::TradeNegotiate { .. }))
        );
    }

    #[test]
    fn regrowth_plants_a_tree() {
        let mut ctx = small_context();
        ctx.config.world.tree_regrowth_ticks = 1;
        let summary = advance(&mut ctx).unwrap();
        assert_eq!(summary.trees_grown, 1);
        assert_eq!(ctx.objects.len(), 1);
    }

    #[test]
    fn certain_catastrophe_destroys_shelters_at_day_boundary() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        ctx.config.world.shelter_catastrophe_chance = 1.0;
        ctx.objects.place_shelter(robinson, Position::new(8, 8));
        ctx.clock = crate::clock::WorldClock::at(23);
        let summary = advance(&mut ctx).unwrap();
        assert_eq!(summary.shelters_destroyed, 1);
        assert!(ctx.objects.shelter_of(robinson).is_none());
        assert_eq!(
            ctx.actors.get(&robinson).unwrap().long_term_memory.housing,
            HousingStatus::Unhoused
        );
    }
}
