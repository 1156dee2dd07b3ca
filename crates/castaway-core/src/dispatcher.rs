//! The event dispatcher: turns the queue head into an action.
//!
//! [`process`] is called once per tick. It keeps handling heads while each
//! one only rearranged the queue (dropped, replaced by a prerequisite, or
//! consumed without starting anything) and stops after the first event that
//! started an action, was postponed, or issued a collaborator request. The
//! loop is bounded by `simulation.dispatch_budget`.
//!
//! Preconditions that cannot be met abandon the actor's plan and put a
//! decide-goal at the front of the queue instead of failing the tick.

use castaway_agents::inventory;
use castaway_types::{
    ActionState, Actor, ActorId, Event, EventKind, InventionId, LogKind, ObjectId, Position,
    Resource,
};
use tracing::debug;

use crate::context::SimulationContext;
use crate::negotiation;

/// What handling one queue head did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// The head was consumed or replaced without starting anything.
    Rearranged,
    /// An action started.
    Started,
    /// The head went to the back of the queue.
    Postponed,
    /// A collaborator request was issued.
    Requested,
}

/// Handle queue heads until one starts something or the budget runs out.
///
/// Returns the number of heads handled.
pub fn process(ctx: &mut SimulationContext) -> u32 {
    let budget = ctx.config.simulation.dispatch_budget;
    let mut handled: u32 = 0;
    while handled < budget {
        let Some(event) = ctx.queue.head().cloned() else {
            break;
        };
        handled = handled.saturating_add(1);
        let step = handle(ctx, event);
        if step != Step::Rearranged {
            break;
        }
    }
    handled
}

fn handle(ctx: &mut SimulationContext, event: Event) -> Step {
    let id = event.actor;
    let Some(idle) = ctx.actors.get(&id).map(Actor::is_idle) else {
        debug!(actor = %id, kind = event.kind.name(), "dropping event for missing actor");
        ctx.queue.pop_head();
        return Step::Rearranged;
    };

    if let EventKind::TradeNegotiate { trade, offer } = event.kind {
        return negotiation::negotiate(ctx, id, trade, offer);
    }
    if !idle {
        ctx.queue.postpone_head();
        return Step::Postponed;
    }

    match event.kind {
        EventKind::DecideGoal => decide(ctx, id),
        EventKind::Idle => {
            if let Some(actor) = ctx
                .actors
                .get_mut(&id)
                .filter(|a| a.plan.front() == Some(&EventKind::Idle))
            {
                actor.plan.pop_front();
            }
            ctx.queue.pop_head();
            Step::Rearranged
        }
        EventKind::Move { destination, then } => {
            start(ctx, id, ActionState::Moving { destination, then });
            let name = ctx.name_of(id);
            ctx.note(LogKind::Action, Some(id), format!("{name} is moving."));
            Step::Started
        }
        EventKind::Gather {
            resource,
            source,
            target_amount,
            gathered,
        } => gather(ctx, id, resource, source, target_amount, gathered),
        EventKind::Sleep => {
            let at_shelter = ctx.actors.get(&id).is_some_and(|a| {
                ctx.objects
                    .shelter_of(id)
                    .is_some_and(|s| s.position == a.position)
            });
            start(ctx, id, ActionState::Sleeping { at_shelter });
            let name = ctx.name_of(id);
            ctx.note(LogKind::Action, Some(id), format!("{name} is going to sleep."));
            Step::Started
        }
        EventKind::Consume { resource } => {
            let name = ctx.name_of(id);
            if !resource.is_food() {
                return abandon(
                    ctx,
                    id,
                    LogKind::Info,
                    format!("{name} can't eat {resource}. Re-evaluating plan."),
                );
            }
            start(ctx, id, ActionState::Eating { resource });
            ctx.note(
                LogKind::Action,
                Some(id),
                format!("{name} starts eating a {resource}."),
            );
            Step::Started
        }
        EventKind::CraftAxe => craft_axe(ctx, id),
        EventKind::BuildShelter => build_shelter(ctx, id),
        EventKind::BuildInvention { invention } => build_invention(ctx, id, invention),
        EventKind::TradeInitiate { partner, terms } => {
            negotiation::initiate(ctx, id, partner, terms)
        }
        EventKind::TradeFinalize => negotiation::finalize(ctx, id),
        EventKind::TradeNegotiate { .. } => Step::Rearranged,
    }
}

/// Pop the head and put `actor` into `action`.
fn start(ctx: &mut SimulationContext, id: ActorId, action: ActionState) {
    ctx.queue.pop_head();
    if let Some(actor) = ctx.actors.get_mut(&id) {
        actor.action = action;
        actor.action_progress = 0;
    }
}

/// Log `message`, drop the plan, and replace the head with a decide-goal.
fn abandon(ctx: &mut SimulationContext, id: ActorId, kind: LogKind, message: String) -> Step {
    ctx.note(kind, Some(id), message);
    if let Some(actor) = ctx.actors.get_mut(&id) {
        actor.plan.clear();
    }
    ctx.queue.replace_head(Some(Event::decide(id)));
    Step::Rearranged
}

fn decide(ctx: &mut SimulationContext, id: ActorId) -> Step {
    start(ctx, id, ActionState::Thinking);
    ctx.request_goal(id);
    Step::Requested
}

fn gather(
    ctx: &mut SimulationContext,
    id: ActorId,
    resource: Resource,
    source: Option<ObjectId>,
    target_amount: Option<u32>,
    gathered: u32,
) -> Step {
    let Some(position) = ctx.actors.get(&id).map(|a| a.position) else {
        return Step::Rearranged;
    };
    let found = source.and_then(|s| ctx.objects.get(s)).map(|o| (o.id, o.position));
    if let Some((object, _)) = found.filter(|(_, at)| *at == position) {
        start(
            ctx,
            id,
            ActionState::Gathering {
                resource,
                source: object,
                target_amount,
                gathered,
            },
        );
        let name = ctx.name_of(id);
        ctx.note(
            LogKind::Action,
            Some(id),
            format!("{name} starts gathering {resource}."),
        );
        return Step::Started;
    }

    if source.is_some() && found.is_none() {
        let name = ctx.name_of(id);
        ctx.note(
            LogKind::System,
            Some(id),
            format!("{name} failed to gather: target object not found."),
        );
    }
    let next = resolve_gather(ctx, id, resource, target_amount, gathered);
    ctx.queue.replace_head(Some(next));
    Step::Rearranged
}

fn craft_axe(ctx: &mut SimulationContext, id: ActorId) -> Step {
    let name = ctx.name_of(id);
    let affordable = ctx
        .actors
        .get(&id)
        .is_some_and(|a| inventory::can_afford(&a.inventory, &ctx.config.costs.axe));
    if !affordable {
        return abandon(
            ctx,
            id,
            LogKind::Info,
            format!("{name} lacks resources to craft an axe."),
        );
    }
    start(ctx, id, ActionState::CraftingAxe);
    ctx.note(LogKind::Action, Some(id), format!("{name} starts crafting an axe."));
    Step::Started
}

fn build_shelter(ctx: &mut SimulationContext, id: ActorId) -> Step {
    let name = ctx.name_of(id);
    let affordable = ctx
        .actors
        .get(&id)
        .is_some_and(|a| inventory::can_afford(&a.inventory, &ctx.config.costs.shelter));
    if !affordable {
        return abandon(
            ctx,
            id,
            LogKind::Info,
            format!("{name} lacks resources to build a shelter."),
        );
    }
    let next = resolve_build(ctx, id);
    if next.kind != EventKind::BuildShelter {
        ctx.queue.replace_head(Some(next));
        return Step::Rearranged;
    }
    start(ctx, id, ActionState::BuildingShelter);
    ctx.note(LogKind::Action, Some(id), format!("{name} starts building a shelter."));
    Step::Started
}

fn build_invention(
    ctx: &mut SimulationContext,
    id: ActorId,
    invention: InventionId,
) -> Step {
    let name = ctx.name_of(id);
    let Some(known) = ctx.inventions.get(&invention) else {
        return abandon(
            ctx,
            id,
            LogKind::Info,
            format!("{name} doesn't know how to build that. Re-evaluating plan."),
        );
    };
    let title = known.name.clone();
    let affordable = ctx
        .actors
        .get(&id)
        .is_some_and(|a| inventory::can_afford(&a.inventory, &known.cost));
    if !affordable {
        return abandon(
            ctx,
            id,
            LogKind::Info,
            format!("{name} lacks resources to build {title}."),
        );
    }
    start(ctx, id, ActionState::BuildingInvention { invention });
    ctx.note(LogKind::Action, Some(id), format!("{name} starts building {title}."));
    Step::Started
}

// ---------------------------------------------------------------------------
// Plan preconditions
// ---------------------------------------------------------------------------

/// Turn the head of `id`'s plan into the event to queue next.
///
/// Gathering is routed to the nearest matching source and building to a
/// clear spot, with a move spliced in front when the actor is elsewhere.
pub(crate) fn resolve_step(ctx: &mut SimulationContext, id: ActorId, step: EventKind) -> Event {
    match step {
        EventKind::Gather {
            resource,
            target_amount,
            gathered,
            ..
        } => resolve_gather(ctx, id, resource, target_amount, gathered),
        EventKind::BuildShelter => resolve_build(ctx, id),
        kind => Event::new(id, kind),
    }
}

fn resolve_gather(
    ctx: &mut SimulationContext,
    id: ActorId,
    resource: Resource,
    target_amount: Option<u32>,
    gathered: u32,
) -> Event {
    let Some(position) = ctx.actors.get(&id).map(|a| a.position) else {
        return Event::decide(id);
    };
    let nearest = ctx
        .objects
        .nearest_source(resource, position)
        .map(|o| (o.id, o.position));
    let Some((object, at)) = nearest else {
        let name = ctx.name_of(id);
        ctx.note(
            LogKind::Info,
            Some(id),
            format!("{name} wanted to gather {resource}, but none could be found. Re-evaluating plan."),
        );
        if let Some(actor) = ctx.actors.get_mut(&id) {
            actor.plan.clear();
        }
        return Event::decide(id);
    };
    let gather = Event::new(
        id,
        EventKind::Gather {
            resource,
            source: Some(object),
            target_amount,
            gathered,
        },
    );
    if at == position {
        gather
    } else {
        move_then(id, at, gather)
    }
}

fn resolve_build(ctx: &mut SimulationContext, id: ActorId) -> Event {
    let Some(position) = ctx.actors.get(&id).map(|a| a.position) else {
        return Event::decide(id);
    };
    let name = ctx.name_of(id);
    match ctx.objects.find_build_spot(&ctx.island, position) {
        None => {
            ctx.note(
                LogKind::Info,
                Some(id),
                format!("{name} can't find a clear spot to build. Re-evaluating plan."),
            );
            if let Some(actor) = ctx.actors.get_mut(&id) {
                actor.plan.clear();
            }
            Event::decide(id)
        }
        Some(spot) if spot != position => {
            ctx.note(
                LogKind::Action,
                Some(id),
                format!("{name} needs to move to a clear spot to build."),
            );
            move_then(id, spot, Event::new(id, EventKind::BuildShelter))
        }
        Some(_) => Event::new(id, EventKind::BuildShelter),
    }
}

fn move_then(id: ActorId, destination: Position, then: Event) -> Event {
    Event::new(
        id,
        EventKind::Move {
            destination,
            then: Some(Box::new(then)),
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use castaway_types::ObjectKind;
    use castaway_world::new_object;

    use super::*;
    use crate::collaborator::CollaboratorRequest;
    use crate::context::tests::{id_of, small_context};

    #[test]
    fn decide_goal_starts_thinking_and_requests() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        ctx.queue.queue_decide(robinson, false);
        assert_eq!(process(&mut ctx), 1);
        assert_eq!(ctx.actors.get(&robinson).unwrap().action, ActionState::Thinking);
        assert!(ctx.goal_outstanding(robinson));
        assert!(matches!(
            ctx.drain_requests().as_slice(),
            [CollaboratorRequest::Goal(_)]
        ));
    }

    #[test]
    fn busy_actor_decide_is_postponed() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        let friday = id_of(&ctx, "Friday");
        ctx.actors.get_mut(&robinson).unwrap().action = ActionState::CraftingAxe;
        ctx.queue.queue_decide(robinson, false);
        ctx.queue.queue(Event::new(friday, EventKind::Sleep), false);

        process(&mut ctx);
        assert_eq!(ctx.queue.head().unwrap().actor, friday);
        process(&mut ctx);
        assert!(matches!(
            ctx.actors.get(&friday).unwrap().action,
            ActionState::Sleeping { at_shelter: false }
        ));
        assert_eq!(ctx.queue.decide_count(robinson), 1);
    }

    #[test]
    fn events_for_missing_actors_are_dropped() {
        let mut ctx = small_context();
        let friday = id_of(&ctx, "Friday");
        ctx.queue.queue(Event::new(ActorId::new(), EventKind::Sleep), false);
        ctx.queue.queue(Event::new(friday, EventKind::Sleep), false);
        assert_eq!(process(&mut ctx), 2);
        assert!(ctx.queue.is_empty());
    }

    #[test]
    fn distant_gather_splices_a_move() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        let rock = ctx.objects.insert(new_object(ObjectKind::Rock, Position::new(4, 1)));
        let step = EventKind::Gather {
            resource: Resource::Stone,
            source: None,
            target_amount: Some(3),
            gathered: 0,
        };
        ctx.actors.get_mut(&robinson).unwrap().plan.push_back(step.clone());
        let event = resolve_step(&mut ctx, robinson, step);
        let EventKind::Move { destination, then } = event.kind else {
            panic!("expected a move");
        };
        assert_eq!(destination, Position::new(4, 1));
        assert!(matches!(
            then.unwrap().kind,
            EventKind::Gather { source: Some(s), .. } if s == rock
        ));
    }

    #[test]
    fn gather_without_source_abandons_plan() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        let step = EventKind::Gather {
            resource: Resource::Fish,
            source: None,
            target_amount: None,
            gathered: 0,
        };
        ctx.actors.get_mut(&robinson).unwrap().plan.push_back(step.clone());
        ctx.queue.queue(Event::new(robinson, step), false);
        process(&mut ctx);
        assert!(ctx.actors.get(&robinson).unwrap().plan.is_empty());
        assert!(ctx
            .log
            .contains("Robinson wanted to gather Fish, but none could be found."));
        assert_eq!(ctx.actors.get(&robinson).unwrap().action, ActionState::Thinking);
    }

    #[test]
    fn gather_starts_only_at_the_source() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        let friday = id_of(&ctx, "Friday");
        let here = ctx.objects.insert(new_object(ObjectKind::Rock, Position::new(1, 1)));
        let far = ctx.objects.insert(new_object(ObjectKind::Rock, Position::new(8, 8)));
        for (actor, source) in [(robinson, here), (friday, far)] {
            let step = EventKind::Gather {
                resource: Resource::Stone,
                source: Some(source),
                target_amount: Some(2),
                gathered: 0,
            };
            ctx.actors.get_mut(&actor).unwrap().plan.push_back(step.clone());
            ctx.queue.queue(Event::new(actor, step), false);
        }
        process(&mut ctx);
        assert!(matches!(
            ctx.actors.get(&robinson).unwrap().action,
            ActionState::Gathering { source, .. } if source == here
        ));
        assert!(!matches!(
            ctx.actors.get(&friday).unwrap().action,
            ActionState::Gathering { .. }
        ));
    }

    #[test]
    fn unaffordable_shelter_forces_replanning() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        ctx.actors
            .get_mut(&robinson)
            .unwrap()
            .plan
            .push_back(EventKind::BuildShelter);
        ctx.queue.queue(Event::new(robinson, EventKind::BuildShelter), false);
        process(&mut ctx);
        assert!(ctx.log.contains("Robinson lacks resources to build a shelter."));
        assert!(ctx.actors.get(&robinson).unwrap().plan.is_empty());
    }

    #[test]
    fn blocked_build_spot_moves_to_neighbour() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        ctx.objects.insert(new_object(ObjectKind::Rock, Position::new(1, 1)));
        ctx.actors.get_mut(&robinson).unwrap().inventory =
            BTreeMap::from([(Resource::Wood, 10), (Resource::Stone, 5)]);
        ctx.queue.queue(Event::new(robinson, EventKind::BuildShelter), false);
        process(&mut ctx);
        assert!(ctx.log.contains("Robinson needs to move to a clear spot to build."));
        assert!(matches!(
            ctx.actors.get(&robinson).unwrap().action,
            ActionState::Moving { then: Some(_), .. }
        ));
    }

    #[test]
    fn idle_plan_step_is_consumed() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        ctx.actors
            .get_mut(&robinson)
            .unwrap()
            .plan
            .extend([EventKind::Idle, EventKind::Sleep]);
        ctx.queue.queue(Event::new(robinson, EventKind::Idle), false);
        assert_eq!(process(&mut ctx), 1);
        let actor = ctx.actors.get(&robinson).unwrap();
        assert!(actor.is_idle());
        assert_eq!(actor.plan.front(), Some(&EventKind::Sleep));
    }
}
