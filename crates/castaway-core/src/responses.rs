//! Applying collaborator answers between ticks.
//!
//! A response from an earlier session (epoch mismatch) is dropped before it
//! touches anything. A response from this session whose request has since
//! been superseded is dropped with an event-log note.

use castaway_agents::memory;
use castaway_types::{ActionState, ActorId, EventKind, LogKind};
use tracing::{debug, warn};

use crate::collaborator::{CollaboratorResponse, GoalDecision};
use crate::context::SimulationContext;
use crate::{discovery, negotiation};

/// What happened to a collaborator response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The answer was applied to the simulation.
    Applied,
    /// The answer belongs to an earlier session and was ignored.
    StaleEpoch,
    /// The request it answers is no longer outstanding.
    Superseded,
}

/// Apply one collaborator response to `ctx`.
pub fn apply_response(ctx: &mut SimulationContext, response: CollaboratorResponse) -> ResponseOutcome {
    let stamp = response.stamp();
    if stamp.epoch != ctx.epoch {
        warn!(
            response_epoch = %stamp.epoch,
            current_epoch = %ctx.epoch,
            actor = %stamp.actor,
            "Discarding collaborator response from a previous session"
        );
        return ResponseOutcome::StaleEpoch;
    }

    match response {
        CollaboratorResponse::Goal { stamp, decision } => {
            if !ctx.claim_goal(stamp) || !ctx.actors.contains_key(&stamp.actor) {
                let name = ctx.name_of(stamp.actor);
                ctx.note(
                    LogKind::System,
                    Some(stamp.actor),
                    format!("A stale AI goal for {name} was discarded."),
                );
                return ResponseOutcome::Superseded;
            }
            apply_goal(ctx, stamp.actor, decision);
            ResponseOutcome::Applied
        }
        CollaboratorResponse::Trade {
            stamp,
            trade,
            offer,
            decision,
        } => {
            if !negotiation::awaits_decision(ctx, trade, &offer, stamp.actor) {
                let name = ctx.name_of(stamp.actor);
                ctx.note(
                    LogKind::System,
                    Some(stamp.actor),
                    format!("A stale AI response for {name} was discarded."),
                );
                return ResponseOutcome::Superseded;
            }
            negotiation::apply_decision(ctx, trade, &offer, stamp.actor, decision);
            ResponseOutcome::Applied
        }
        CollaboratorResponse::Invention {
            stamp,
            category,
            draft,
        } => {
            discovery::apply(ctx, stamp.actor, category, draft);
            ResponseOutcome::Applied
        }
    }
}

/// Plan steps the collaborator may not schedule directly.
const fn plannable(step: &EventKind) -> bool {
    !matches!(
        step,
        EventKind::DecideGoal | EventKind::Move { .. } | EventKind::TradeNegotiate { .. }
    )
}

fn apply_goal(ctx: &mut SimulationContext, id: ActorId, decision: GoalDecision) {
    let capacity = ctx.memory_capacity();
    let GoalDecision {
        goal,
        reasoning,
        plan,
        memory_entry,
    } = decision;
    let Some(actor) = ctx.actors.get_mut(&id) else {
        return;
    };
    if let Some(entry) = memory_entry.filter(|e| !e.trim().is_empty()) {
        memory::remember(actor, entry, capacity);
    }
    actor.goal.clone_from(&goal);
    actor.plan = plan
        .into_iter()
        .map(|step| if plannable(&step) { step } else { EventKind::Idle })
        .collect();
    if matches!(actor.action, ActionState::Thinking) {
        actor.action = ActionState::Idle;
        actor.action_progress = 0;
    }
    let empty = actor.plan.is_empty();
    let steps = actor.plan.len();
    let name = actor.name.clone();

    ctx.note(
        LogKind::Info,
        Some(id),
        format!("AI for {name} sets plan for goal: {goal}. Reason: {reasoning}"),
    );
    debug!(actor = %id, %goal, steps, "Goal applied");
    if empty {
        ctx.queue.queue_decide(id, false);
    }
}
