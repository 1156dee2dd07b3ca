//! The trade negotiation protocol.
//!
//! A trade walks the status graph `Moving -> Negotiating -> {Accepted,
//! Rejected, Failed}` or, on accept-and-gather, `Negotiating -> Gathering ->
//! Finalizing -> {Fulfilled, Failed}`. Affordability is checked at every
//! commit point (accept and finalize), never escrowed.
//!
//! The dispatcher calls [`initiate`], [`negotiate`] and [`finalize`];
//! collaborator decisions arrive through [`apply_decision`].

use castaway_agents::{memory, trade as settle};
use castaway_types::{
    ActionState, ActorId, Event, EventKind, LogKind, PendingTrade, Trade, TradeDecisionKind,
    TradeId, TradeOffer, TradeStatus, TradeTerms,
};
use tracing::{debug, info, warn};

use crate::collaborator::TradeDecision;
use crate::context::SimulationContext;
use crate::dispatcher::Step;

/// Goal an actor carries while it gathers goods it already agreed to trade.
pub const FULFILLING_TRADE_GOAL: &str = "Fulfilling Trade";

fn set_idle(ctx: &mut SimulationContext, id: ActorId) {
    if let Some(actor) = ctx.actors.get_mut(&id) {
        actor.action = ActionState::Idle;
        actor.action_progress = 0;
    }
}

fn set_action(ctx: &mut SimulationContext, id: ActorId, action: ActionState) {
    if let Some(actor) = ctx.actors.get_mut(&id) {
        actor.action = action;
        actor.action_progress = 0;
    }
}

/// The trade an action state is tied to.
const fn held_trade(action: &ActionState) -> Option<TradeId> {
    match action {
        ActionState::Negotiating { trade }
        | ActionState::AwaitingTradeResponse { trade }
        | ActionState::MovingToTrade { trade, .. } => Some(*trade),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Initiation
// ---------------------------------------------------------------------------

/// Handle a TRADE_INITIATE event at the queue head.
///
/// The plan step is consumed here whatever the outcome.
pub(crate) fn initiate(
    ctx: &mut SimulationContext,
    initiator: ActorId,
    partner: ActorId,
    terms: TradeTerms,
) -> Step {
    if let Some(actor) = ctx
        .actors
        .get_mut(&initiator)
        .filter(|a| matches!(a.plan.front(), Some(EventKind::TradeInitiate { .. })))
    {
        actor.plan.pop_front();
    }

    let name = ctx.name_of(initiator);
    let cooldown = ctx.actors.get(&initiator).map_or(0, |a| a.trade_cooldown);
    if cooldown > 0 {
        ctx.note(
            LogKind::Info,
            Some(initiator),
            format!("{name} wants to trade again but needs to wait {cooldown} more hours."),
        );
        ctx.queue.pop_head();
        return Step::Rearranged;
    }

    let partner_position = ctx
        .actors
        .get(&partner)
        .filter(|p| p.id != initiator)
        .map(|p| p.position);
    let (Some(partner_position), Some(position)) = (
        partner_position,
        ctx.actors.get(&initiator).map(|a| a.position),
    ) else {
        ctx.note(
            LogKind::System,
            Some(initiator),
            format!("{name} wanted to trade, but the partner could not be found."),
        );
        ctx.queue.pop_head();
        return Step::Rearranged;
    };

    let trade = Trade::open(initiator, partner, terms);
    let trade_id = trade.id;
    let negotiate = trade.latest_offer().cloned().map(|offer| {
        Event::new(
            partner,
            EventKind::TradeNegotiate {
                trade: trade_id,
                offer,
            },
        )
    });
    ctx.trades.insert(trade_id, trade);
    let Some(negotiate) = negotiate else {
        ctx.queue.pop_head();
        return Step::Rearranged;
    };

    let partner_name = ctx.name_of(partner);
    info!(trade = %trade_id, initiator = %initiator, partner = %partner, %terms, "Trade initiated");

    if position == partner_position {
        set_action(
            ctx,
            initiator,
            ActionState::AwaitingTradeResponse { trade: trade_id },
        );
        ctx.queue.replace_head(Some(negotiate));
        return Step::Rearranged;
    }

    set_action(
        ctx,
        initiator,
        ActionState::MovingToTrade {
            trade: trade_id,
            destination: partner_position,
            then: Box::new(negotiate),
        },
    );
    ctx.note(
        LogKind::Action,
        Some(initiator),
        format!("{name} is going to {partner_name} to trade."),
    );
    ctx.queue.pop_head();
    Step::Started
}

// ---------------------------------------------------------------------------
// Negotiation
// ---------------------------------------------------------------------------

/// Whether `offer` is the live offer of `trade` and nobody is deciding yet.
fn is_fresh(trade: &Trade, offer: &TradeOffer) -> bool {
    let open = match trade.status {
        TradeStatus::Moving => true,
        TradeStatus::Negotiating => trade.decision_maker.is_none(),
        _ => false,
    };
    open && trade.latest_offer() == Some(offer)
}

/// Handle a TRADE_NEGOTIATE event owned by `decider`.
///
/// The decider is pulled out of whatever it was doing; the proposer waits.
pub(crate) fn negotiate(
    ctx: &mut SimulationContext,
    decider: ActorId,
    trade_id: TradeId,
    offer: TradeOffer,
) -> Step {
    let fresh = ctx.trades.get(&trade_id).is_some_and(|t| is_fresh(t, &offer));
    if !fresh {
        ctx.note(
            LogKind::System,
            None,
            format!(
                "Ignoring duplicate trade negotiation event for an already active trade ({trade_id})."
            ),
        );
        ctx.queue.pop_head();
        return Step::Rearranged;
    }
    ctx.queue.pop_head();

    let proposer = offer.from;
    if !ctx.actors.contains_key(&proposer) {
        abort(ctx, trade_id, "Trade partner was not found.");
        return Step::Rearranged;
    }

    release(ctx, decider, Some(trade_id), "Another negotiation took priority.");
    ctx.cancel_goal(decider);

    if let Some(trade) = ctx.trades.get_mut(&trade_id) {
        trade.transition(TradeStatus::Negotiating);
        trade.decision_maker = Some(decider);
    }
    set_action(ctx, decider, ActionState::Negotiating { trade: trade_id });
    set_action(
        ctx,
        proposer,
        ActionState::AwaitingTradeResponse { trade: trade_id },
    );

    let decider_name = ctx.name_of(decider);
    let proposer_name = ctx.name_of(proposer);
    let terms = offer.terms;
    ctx.note(
        LogKind::Trade,
        Some(decider),
        format!(
            "{decider_name} is considering an offer from {proposer_name}: Give {} {} for {} {}",
            terms.take_amount, terms.take, terms.give_amount, terms.give
        ),
    );
    ctx.request_trade(trade_id, offer, decider);
    Step::Requested
}

/// Whether a trade answer from `decider` about `offer` is still wanted.
pub(crate) fn awaits_decision(
    ctx: &SimulationContext,
    trade_id: TradeId,
    offer: &TradeOffer,
    decider: ActorId,
) -> bool {
    ctx.trades.get(&trade_id).is_some_and(|t| {
        t.status == TradeStatus::Negotiating
            && t.decision_maker == Some(decider)
            && t.latest_offer() == Some(offer)
    })
}

/// Apply a collaborator decision to a live negotiation.
///
/// Callers check [`awaits_decision`] first.
pub(crate) fn apply_decision(
    ctx: &mut SimulationContext,
    trade_id: TradeId,
    offer: &TradeOffer,
    decider: ActorId,
    decision: TradeDecision,
) {
    if let Some(trade) = ctx.trades.get_mut(&trade_id) {
        trade.decision_maker = None;
        if let Some(answered) = trade.history.last_mut() {
            answered.decision = Some(decision.decision);
            answered.reasoning = Some(decision.reasoning.clone());
        }
    }
    let decider_name = ctx.name_of(decider);
    ctx.note(
        LogKind::Trade,
        Some(decider),
        format!(
            "AI for {decider_name} decided to {}. Reason: {}",
            decision.decision, decision.reasoning
        ),
    );

    match decision.decision {
        TradeDecisionKind::Accept => accept(ctx, trade_id, offer, decider, decision.reasoning),
        TradeDecisionKind::AcceptAndGather => {
            accept_and_gather(ctx, trade_id, offer, decider, decision.reasoning);
        }
        TradeDecisionKind::Reject => {
            close(ctx, trade_id, TradeStatus::Rejected, decision.reasoning);
            ctx.note(LogKind::Trade, None, "Trade rejected.");
            end_negotiation(ctx, trade_id);
        }
        TradeDecisionKind::Counter => {
            let max_turns = ctx.config.trade.max_negotiation_turns;
            match decision.counter_offer {
                Some(terms) if offer.turn < max_turns => {
                    counter(ctx, trade_id, offer, decider, terms);
                }
                _ => {
                    let reason = if decision.reasoning.trim().is_empty() {
                        String::from("Negotiations broke down.")
                    } else {
                        decision.reasoning
                    };
                    close(ctx, trade_id, TradeStatus::Rejected, reason);
                    ctx.note(LogKind::Trade, None, "Negotiations have broken down.");
                    end_negotiation(ctx, trade_id);
                }
            }
        }
    }
}

fn close(ctx: &mut SimulationContext, trade_id: TradeId, status: TradeStatus, reason: String) {
    if let Some(trade) = ctx.trades.get_mut(&trade_id) {
        if trade.transition(status) {
            trade.final_reasoning = Some(reason);
        } else {
            warn!(trade = %trade_id, from = %trade.status, to = %status, "Illegal trade transition");
        }
    }
}

fn accept(
    ctx: &mut SimulationContext,
    trade_id: TradeId,
    offer: &TradeOffer,
    decider: ActorId,
    reasoning: String,
) {
    let settled = match (
        ctx.actors.remove(&offer.from),
        ctx.actors.remove(&decider),
    ) {
        (Some(mut giver), Some(mut receiver)) => {
            let result = settle::exchange(&mut giver, &mut receiver, offer.terms);
            ctx.actors.insert(giver.id, giver);
            ctx.actors.insert(receiver.id, receiver);
            result.map_err(|err| {
                debug!(trade = %trade_id, error = %err, "Accept failed affordability");
            })
        }
        (giver, receiver) => {
            for actor in [giver, receiver].into_iter().flatten() {
                ctx.actors.insert(actor.id, actor);
            }
            Err(())
        }
    };

    if settled.is_ok() {
        close(ctx, trade_id, TradeStatus::Accepted, reasoning);
        ctx.note(LogKind::Trade, None, "Trade accepted!");
        ctx.note(LogKind::Info, None, "Resources exchanged.");
    } else {
        close(
            ctx,
            trade_id,
            TradeStatus::Failed,
            String::from("A party could not afford the trade."),
        );
        ctx.note(
            LogKind::System,
            None,
            "Trade failed, someone couldn't afford it.",
        );
    }
    end_negotiation(ctx, trade_id);
}

fn accept_and_gather(
    ctx: &mut SimulationContext,
    trade_id: TradeId,
    offer: &TradeOffer,
    decider: ActorId,
    reasoning: String,
) {
    close(ctx, trade_id, TradeStatus::Gathering, reasoning);
    let decider_name = ctx.name_of(decider);
    ctx.note(
        LogKind::Trade,
        Some(decider),
        format!("{decider_name} agrees to the trade, but needs to gather the resources first!"),
    );
    if let Some(actor) = ctx.actors.get_mut(&decider) {
        actor.pending_trade = Some(PendingTrade {
            trade: trade_id,
            partner: offer.from,
            terms: offer.terms.swapped(),
        });
        actor.goal = String::from(FULFILLING_TRADE_GOAL);
    }
    for party in [decider, offer.from] {
        set_idle(ctx, party);
        ctx.queue.queue_decide(party, false);
    }
}

fn counter(
    ctx: &mut SimulationContext,
    trade_id: TradeId,
    offer: &TradeOffer,
    decider: ActorId,
    terms: TradeTerms,
) {
    let next = TradeOffer::new(decider, offer.from, terms, offer.turn.saturating_add(1));
    if let Some(trade) = ctx.trades.get_mut(&trade_id) {
        trade.history.push(next.clone());
    }
    let decider_name = ctx.name_of(decider);
    ctx.note(
        LogKind::Trade,
        Some(decider),
        format!("{decider_name} makes a counter-offer."),
    );
    set_action(
        ctx,
        decider,
        ActionState::AwaitingTradeResponse { trade: trade_id },
    );
    ctx.queue.queue(
        Event::new(
            offer.from,
            EventKind::TradeNegotiate {
                trade: trade_id,
                offer: next,
            },
        ),
        true,
    );
}

/// Wrap up a negotiation that reached a terminal status.
///
/// Both parties remember the outcome, go idle if still tied to the trade,
/// start their cooldown and get a decide-goal queued.
pub(crate) fn end_negotiation(ctx: &mut SimulationContext, trade_id: TradeId) {
    let Some(trade) = ctx.trades.get(&trade_id) else {
        return;
    };
    let status = trade.status;
    let parties = [(trade.initiator, trade.recipient), (trade.recipient, trade.initiator)];
    let details = trade
        .latest_offer()
        .map(|o| settle::describe(o.terms))
        .unwrap_or_default();
    let capacity = ctx.memory_capacity();
    let cooldown = ctx.config.trade.cooldown_ticks;

    for (party, partner) in parties {
        let partner_name = ctx.name_of(partner);
        if let Some(actor) = ctx.actors.get_mut(&party) {
            memory::remember_trade(actor, partner, &partner_name, status, details.clone(), capacity);
            if held_trade(&actor.action) == Some(trade_id) {
                actor.action = ActionState::Idle;
                actor.action_progress = 0;
            }
            actor.trade_cooldown = cooldown;
        }
        ctx.queue.queue_decide(party, false);
    }
    info!(trade = %trade_id, %status, "Negotiation ended");
}

/// Fail an unfinished negotiation and wrap it up.
pub(crate) fn abort(ctx: &mut SimulationContext, trade_id: TradeId, reason: &str) {
    let live = ctx
        .trades
        .get(&trade_id)
        .is_some_and(|t| matches!(t.status, TradeStatus::Moving | TradeStatus::Negotiating));
    if !live {
        return;
    }
    close(ctx, trade_id, TradeStatus::Failed, reason.to_owned());
    ctx.note(LogKind::System, None, format!("A trade was called off: {reason}"));
    end_negotiation(ctx, trade_id);
}

/// Call off every trade whose queued offer `decider` has yet to answer.
///
/// Used before `decider`'s queued events are purged, so no trade is left
/// waiting on a negotiate event that no longer exists.
pub(crate) fn abort_queued(ctx: &mut SimulationContext, decider: ActorId, reason: &str) {
    let queued: Vec<TradeId> = ctx
        .queue
        .iter()
        .filter(|e| e.actor == decider)
        .filter_map(|e| match &e.kind {
            EventKind::TradeNegotiate { trade, .. } => Some(*trade),
            _ => None,
        })
        .collect();
    for trade_id in queued {
        abort(ctx, trade_id, reason);
    }
}

/// Free `id` from a trade-bound action other than `keep`.
pub(crate) fn release(
    ctx: &mut SimulationContext,
    id: ActorId,
    keep: Option<TradeId>,
    reason: &str,
) {
    let held = ctx.actors.get(&id).and_then(|a| held_trade(&a.action));
    if let Some(trade_id) = held.filter(|t| Some(*t) != keep) {
        abort(ctx, trade_id, reason);
    }
}

// ---------------------------------------------------------------------------
// Finalization
// ---------------------------------------------------------------------------

/// Handle a TRADE_FINALIZE event for the actor holding a pending trade.
pub(crate) fn finalize(ctx: &mut SimulationContext, gatherer: ActorId) -> Step {
    ctx.queue.pop_head();
    let name = ctx.name_of(gatherer);
    let Some(actor) = ctx.actors.get_mut(&gatherer) else {
        return Step::Rearranged;
    };
    if matches!(actor.plan.front(), Some(EventKind::TradeFinalize)) {
        actor.plan.pop_front();
    }
    let Some(pending) = actor.pending_trade else {
        actor.plan.clear();
        ctx.note(
            LogKind::Info,
            Some(gatherer),
            format!("{name} has no agreed trade to finalize. Re-evaluating plan."),
        );
        ctx.queue.queue(Event::decide(gatherer), true);
        return Step::Rearranged;
    };

    let finalizing = ctx
        .trades
        .get_mut(&pending.trade)
        .is_some_and(|t| t.transition(TradeStatus::Finalizing));
    if !finalizing {
        if let Some(actor) = ctx.actors.get_mut(&gatherer) {
            actor.pending_trade = None;
            actor.goal = String::from("Idle");
        }
        ctx.queue.queue_decide(gatherer, false);
        return Step::Rearranged;
    }

    if !ctx.actors.contains_key(&pending.partner) {
        ctx.note(
            LogKind::System,
            Some(gatherer),
            format!("{name} went to finalize a trade, but the partner was gone."),
        );
        if let Some(actor) = ctx.actors.get_mut(&gatherer) {
            actor.pending_trade = None;
            actor.goal = String::from("Idle");
        }
        close(
            ctx,
            pending.trade,
            TradeStatus::Failed,
            String::from("Trade partner was not found."),
        );
        ctx.queue.queue_decide(gatherer, false);
        return Step::Rearranged;
    }

    let partner_name = ctx.name_of(pending.partner);
    ctx.note(
        LogKind::Trade,
        Some(gatherer),
        format!("{name} is finalizing the trade with {partner_name}."),
    );

    let settled = match (
        ctx.actors.remove(&gatherer),
        ctx.actors.remove(&pending.partner),
    ) {
        (Some(mut giver), Some(mut receiver)) => {
            let result = settle::exchange(&mut giver, &mut receiver, pending.terms);
            ctx.actors.insert(giver.id, giver);
            ctx.actors.insert(receiver.id, receiver);
            result.is_ok()
        }
        (giver, receiver) => {
            for actor in [giver, receiver].into_iter().flatten() {
                ctx.actors.insert(actor.id, actor);
            }
            false
        }
    };

    if settled {
        close(
            ctx,
            pending.trade,
            TradeStatus::Fulfilled,
            String::from("The agreement was successfully completed."),
        );
        ctx.note(
            LogKind::Trade,
            Some(gatherer),
            "Trade agreement fulfilled successfully!",
        );
    } else {
        close(
            ctx,
            pending.trade,
            TradeStatus::Failed,
            String::from("A party lacked resources upon finalization."),
        );
        ctx.note(
            LogKind::System,
            Some(gatherer),
            "Trade finalization failed. One party did not have the required resources.",
        );
    }

    let status = ctx
        .trades
        .get(&pending.trade)
        .map_or(TradeStatus::Failed, |t| t.status);
    let details = settle::describe(pending.terms);
    let capacity = ctx.memory_capacity();
    for (party, partner) in [(gatherer, pending.partner), (pending.partner, gatherer)] {
        let partner_name = ctx.name_of(partner);
        if let Some(actor) = ctx.actors.get_mut(&party) {
            memory::remember_trade(actor, partner, &partner_name, status, details.clone(), capacity);
            actor.goal = String::from("Idle");
            if party == gatherer {
                actor.pending_trade = None;
            }
        }
        ctx.queue.queue_decide(party, false);
    }
    info!(trade = %pending.trade, %status, "Trade finalized");
    Step::Rearranged
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use castaway_types::{Position, Resource};

    use super::*;
    use crate::collaborator::CollaboratorRequest;
    use crate::context::tests::{id_of, small_context};

    fn wood_for_stone() -> TradeTerms {
        TradeTerms {
            give: Resource::Wood,
            give_amount: 5,
            take: Resource::Stone,
            take_amount: 3,
        }
    }

    fn decision(kind: TradeDecisionKind, counter_offer: Option<TradeTerms>) -> TradeDecision {
        TradeDecision {
            decision: kind,
            reasoning: String::from("because"),
            counter_offer,
        }
    }

    /// Robinson offers 5 Wood for 3 Stone and Friday is asked to decide.
    fn opened(ctx: &mut SimulationContext) -> (ActorId, ActorId, TradeId, TradeOffer) {
        let robinson = id_of(ctx, "Robinson");
        let friday = id_of(ctx, "Friday");
        ctx.actors.get_mut(&friday).unwrap().position = Position::new(1, 1);
        ctx.queue.queue(
            Event::new(
                robinson,
                EventKind::TradeInitiate {
                    partner: friday,
                    terms: wood_for_stone(),
                },
            ),
            false,
        );
        assert_eq!(initiate(ctx, robinson, friday, wood_for_stone()), Step::Rearranged);
        let head = ctx.queue.head().cloned().unwrap();
        let EventKind::TradeNegotiate { trade, offer } = head.kind else {
            panic!("expected negotiate head");
        };
        assert_eq!(head.actor, friday);
        assert_eq!(negotiate(ctx, friday, trade, offer.clone()), Step::Requested);
        (robinson, friday, trade, offer)
    }

    #[test]
    fn negotiation_marks_parties_and_requests_decision() {
        let mut ctx = small_context();
        let (robinson, friday, trade, _) = opened(&mut ctx);
        let t = ctx.trades.get(&trade).unwrap();
        assert_eq!(t.status, TradeStatus::Negotiating);
        assert_eq!(t.decision_maker, Some(friday));
        assert_eq!(
            ctx.actors.get(&friday).unwrap().action,
            ActionState::Negotiating { trade }
        );
        assert_eq!(
            ctx.actors.get(&robinson).unwrap().action,
            ActionState::AwaitingTradeResponse { trade }
        );
        let requests = ctx.drain_requests();
        assert!(matches!(requests.as_slice(), [CollaboratorRequest::Trade(_)]));
    }

    #[test]
    fn duplicate_negotiate_is_ignored() {
        let mut ctx = small_context();
        let (_, friday, trade, offer) = opened(&mut ctx);
        ctx.queue.queue(
            Event::new(friday, EventKind::TradeNegotiate { trade, offer: offer.clone() }),
            true,
        );
        assert_eq!(negotiate(&mut ctx, friday, trade, offer), Step::Rearranged);
        assert!(ctx.log.contains("Ignoring duplicate trade negotiation event"));
        assert_eq!(ctx.drain_requests().len(), 1);
    }

    #[test]
    fn unaffordable_accept_fails_and_cools_down() {
        let mut ctx = small_context();
        let (robinson, friday, trade, offer) = opened(&mut ctx);
        ctx.actors.get_mut(&robinson).unwrap().inventory = BTreeMap::from([(Resource::Wood, 5)]);
        ctx.actors.get_mut(&friday).unwrap().inventory = BTreeMap::from([(Resource::Stone, 1)]);

        assert!(awaits_decision(&ctx, trade, &offer, friday));
        apply_decision(&mut ctx, trade, &offer, friday, decision(TradeDecisionKind::Accept, None));

        let t = ctx.trades.get(&trade).unwrap();
        assert_eq!(t.status, TradeStatus::Failed);
        assert_eq!(
            t.final_reasoning.as_deref(),
            Some("A party could not afford the trade.")
        );
        let answered = t.latest_offer().unwrap();
        assert_eq!(answered.decision, Some(TradeDecisionKind::Accept));
        assert_eq!(answered.reasoning.as_deref(), Some("because"));
        for id in [robinson, friday] {
            let actor = ctx.actors.get(&id).unwrap();
            assert!(actor.is_idle());
            assert_eq!(actor.trade_cooldown, ctx.config.trade.cooldown_ticks);
            assert!(ctx.queue.has_decide_for(id));
            assert_eq!(
                actor.long_term_memory.last_trade.as_ref().unwrap().outcome,
                TradeStatus::Failed
            );
        }
        assert_eq!(
            ctx.actors.get(&friday).unwrap().inventory,
            BTreeMap::from([(Resource::Stone, 1)])
        );
    }

    #[test]
    fn affordable_accept_exchanges_goods() {
        let mut ctx = small_context();
        let (robinson, friday, trade, offer) = opened(&mut ctx);
        ctx.actors.get_mut(&robinson).unwrap().inventory = BTreeMap::from([(Resource::Wood, 5)]);
        ctx.actors.get_mut(&friday).unwrap().inventory = BTreeMap::from([(Resource::Stone, 3)]);
        apply_decision(&mut ctx, trade, &offer, friday, decision(TradeDecisionKind::Accept, None));
        assert_eq!(ctx.trades.get(&trade).unwrap().status, TradeStatus::Accepted);
        assert_eq!(
            ctx.actors.get(&robinson).unwrap().inventory,
            BTreeMap::from([(Resource::Stone, 3)])
        );
        assert_eq!(
            ctx.actors.get(&friday).unwrap().inventory,
            BTreeMap::from([(Resource::Wood, 5)])
        );
    }

    #[test]
    fn counter_within_limit_swaps_roles() {
        let mut ctx = small_context();
        let (robinson, friday, trade, offer) = opened(&mut ctx);
        let counter_terms = TradeTerms {
            give: Resource::Stone,
            give_amount: 2,
            take: Resource::Wood,
            take_amount: 5,
        };
        apply_decision(
            &mut ctx,
            trade,
            &offer,
            friday,
            decision(TradeDecisionKind::Counter, Some(counter_terms)),
        );
        let t = ctx.trades.get(&trade).unwrap();
        assert_eq!(t.status, TradeStatus::Negotiating);
        assert_eq!(t.history.len(), 2);
        let first = t.history.first().unwrap();
        assert_eq!(first.decision, Some(TradeDecisionKind::Counter));
        assert_eq!(t.latest_offer().unwrap().decision, None);
        let head = ctx.queue.head().unwrap();
        assert_eq!(head.actor, robinson);
        let EventKind::TradeNegotiate { offer: next, .. } = &head.kind else {
            panic!("expected negotiate head");
        };
        assert_eq!(next.turn, 2);
        assert_eq!(next.from, friday);

        let next = next.clone();
        assert_eq!(negotiate(&mut ctx, robinson, trade, next), Step::Requested);
        assert_eq!(
            ctx.actors.get(&friday).unwrap().action,
            ActionState::AwaitingTradeResponse { trade }
        );
    }

    #[test]
    fn rejection_is_recorded_on_the_answered_offer() {
        let mut ctx = small_context();
        let (_, friday, trade, offer) = opened(&mut ctx);
        let reject = TradeDecision {
            decision: TradeDecisionKind::Reject,
            reasoning: String::from("too pricey"),
            counter_offer: None,
        };
        apply_decision(&mut ctx, trade, &offer, friday, reject);

        let t = ctx.trades.get(&trade).unwrap();
        assert_eq!(t.status, TradeStatus::Rejected);
        let answered = t.latest_offer().unwrap();
        assert_eq!(answered.decision, Some(TradeDecisionKind::Reject));
        assert_eq!(answered.reasoning.as_deref(), Some("too pricey"));
    }

    #[test]
    fn counter_at_turn_limit_is_rejected() {
        let mut ctx = small_context();
        let (_, friday, trade, offer) = opened(&mut ctx);
        ctx.config.trade.max_negotiation_turns = 1;
        apply_decision(
            &mut ctx,
            trade,
            &offer,
            friday,
            decision(TradeDecisionKind::Counter, Some(wood_for_stone().swapped())),
        );
        let t = ctx.trades.get(&trade).unwrap();
        assert_eq!(t.status, TradeStatus::Rejected);
        assert_eq!(t.history.len(), 1);
        assert!(ctx.log.contains("Negotiations have broken down."));
        assert!(!ctx
            .queue
            .iter()
            .any(|e| matches!(e.kind, EventKind::TradeNegotiate { .. })));
    }

    #[test]
    fn accept_and_gather_then_finalize() {
        let mut ctx = small_context();
        let (robinson, friday, trade, offer) = opened(&mut ctx);
        ctx.actors.get_mut(&robinson).unwrap().inventory = BTreeMap::from([(Resource::Wood, 5)]);
        ctx.actors.get_mut(&friday).unwrap().inventory = BTreeMap::new();

        apply_decision(
            &mut ctx,
            trade,
            &offer,
            friday,
            decision(TradeDecisionKind::AcceptAndGather, None),
        );
        assert_eq!(ctx.trades.get(&trade).unwrap().status, TradeStatus::Gathering);
        let pending = ctx.actors.get(&friday).unwrap().pending_trade.unwrap();
        assert_eq!(pending.partner, robinson);
        assert_eq!(pending.terms.give, Resource::Stone);
        assert_eq!(ctx.actors.get(&friday).unwrap().goal, FULFILLING_TRADE_GOAL);
        assert_eq!(ctx.actors.get(&robinson).unwrap().trade_cooldown, 0);

        ctx.actors
            .get_mut(&friday)
            .unwrap()
            .inventory
            .insert(Resource::Stone, 3);
        ctx.queue.clear();
        ctx.queue.queue(Event::new(friday, EventKind::TradeFinalize), false);
        assert_eq!(finalize(&mut ctx, friday), Step::Rearranged);

        assert_eq!(ctx.trades.get(&trade).unwrap().status, TradeStatus::Fulfilled);
        assert!(ctx.actors.get(&friday).unwrap().pending_trade.is_none());
        assert_eq!(
            ctx.actors.get(&friday).unwrap().holding(Resource::Wood),
            5
        );
        assert!(ctx.queue.has_decide_for(friday));
        assert!(ctx.queue.has_decide_for(robinson));
    }

    #[test]
    fn initiate_during_cooldown_is_dropped() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        let friday = id_of(&ctx, "Friday");
        ctx.actors.get_mut(&robinson).unwrap().trade_cooldown = 3;
        ctx.queue.queue(
            Event::new(
                robinson,
                EventKind::TradeInitiate {
                    partner: friday,
                    terms: wood_for_stone(),
                },
            ),
            false,
        );
        assert_eq!(initiate(&mut ctx, robinson, friday, wood_for_stone()), Step::Rearranged);
        assert!(ctx.trades.is_empty());
        assert!(ctx.queue.is_empty());
    }

    #[test]
    fn distant_partner_means_walking_first() {
        let mut ctx = small_context();
        let robinson = id_of(&ctx, "Robinson");
        let friday = id_of(&ctx, "Friday");
        ctx.queue.queue(
            Event::new(
                robinson,
                EventKind::TradeInitiate {
                    partner: friday,
                    terms: wood_for_stone(),
                },
            ),
            false,
        );
        assert_eq!(initiate(&mut ctx, robinson, friday, wood_for_stone()), Step::Started);
        let action = &ctx.actors.get(&robinson).unwrap().action;
        assert!(matches!(action, ActionState::MovingToTrade { destination, .. } if *destination == Position::new(5, 5)));
        assert_eq!(ctx.trades.values().next().unwrap().status, TradeStatus::Moving);
        assert!(ctx.log.contains("Robinson is going to Friday to trade."));
    }
}
