//! The reasoning collaborator seam.
//!
//! A [`Reasoner`] turns structured state into goal, trade and invention
//! decisions. It is slow and fallible, so the engine only ever reaches it
//! through [`answer`], which bounds every call with a timeout and replaces
//! failures with deterministic fallbacks. [`answer`] therefore always
//! produces a response; collaborator failures never reach the tick loop.
//!
//! [`FallbackReasoner`] is the "AI disabled" collaborator: it applies the
//! same deterministic survival rules without any backend.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use castaway_types::{EventKind, Resource, TradeDecisionKind};
use tracing::{debug, warn};

use crate::collaborator::{
    CollaboratorRequest, CollaboratorResponse, GoalDecision, GoalRequest, InventionDraft,
    InventionRequest, InventionSpec, TradeDecision, TradeRequest,
};

/// Icon used when drawing fails or no backend is configured.
pub const DEFAULT_ICON: &str = r#"<path d="M12 2L2 22h20L12 2zm0 4l7 12H5l7-12z" />"#;

/// Hunger below which the fallback plan looks for food.
const FALLBACK_HUNGER: f64 = 50.0;

/// Energy below which the fallback plan sleeps.
const FALLBACK_ENERGY: f64 = 30.0;

/// Coconuts the fallback plan gathers when hungry and empty-handed.
const FALLBACK_COCONUTS: u32 = 5;

/// Errors a reasoning backend can report.
#[derive(Debug, thiserror::Error)]
pub enum ReasonerError {
    /// No backend is configured for this kind of request.
    #[error("reasoning backend disabled")]
    Disabled,

    /// The call exceeded its time budget.
    #[error("collaborator timed out after {timeout_ms}ms")]
    Timeout {
        /// The budget that was exceeded.
        timeout_ms: u64,
    },

    /// Transport or API failure.
    #[error("backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },

    /// The backend answered with something unusable.
    #[error("malformed response: {reason}")]
    Malformed {
        /// What was wrong with it.
        reason: String,
    },
}

/// A source of goal, trade and invention decisions.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Choose a goal and plan for `request.actor`.
    async fn decide_goal(&self, request: &GoalRequest) -> Result<GoalDecision, ReasonerError>;

    /// Answer a trade offer on behalf of `request.decider`.
    async fn decide_trade(&self, request: &TradeRequest) -> Result<TradeDecision, ReasonerError>;

    /// Flesh out an invention idea.
    async fn specify_invention(
        &self,
        request: &InventionRequest,
    ) -> Result<InventionSpec, ReasonerError>;

    /// Draw an icon for a specified invention.
    async fn draw_icon(
        &self,
        spec: &InventionSpec,
        request: &InventionRequest,
    ) -> Result<String, ReasonerError>;
}

/// Deterministic collaborator used when no backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackReasoner;

#[async_trait]
impl Reasoner for FallbackReasoner {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn decide_goal(&self, request: &GoalRequest) -> Result<GoalDecision, ReasonerError> {
        Ok(fallback_goal(request))
    }

    async fn decide_trade(&self, request: &TradeRequest) -> Result<TradeDecision, ReasonerError> {
        Ok(fallback_trade(request))
    }

    async fn specify_invention(
        &self,
        _request: &InventionRequest,
    ) -> Result<InventionSpec, ReasonerError> {
        Err(ReasonerError::Disabled)
    }

    async fn draw_icon(
        &self,
        _spec: &InventionSpec,
        _request: &InventionRequest,
    ) -> Result<String, ReasonerError> {
        Ok(DEFAULT_ICON.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Fallback decisions
// ---------------------------------------------------------------------------

/// Basic survival logic.
///
/// A pending accept-and-gather trade comes first: settle it when the goods
/// are at hand, otherwise gather the shortfall and then settle. Without a
/// commitment: eat or gather food when hungry, sleep when tired, else idle.
pub fn fallback_goal(request: &GoalRequest) -> GoalDecision {
    let actor = &request.actor;
    let (goal, plan) = if let Some(pending) = request.pending_trade() {
        let owed = pending.terms.give;
        let shortfall = pending.terms.give_amount.saturating_sub(actor.holding(owed));
        if shortfall == 0 || owed.source_kind().is_none() {
            ("Fulfilling Trade", vec![EventKind::TradeFinalize])
        } else {
            (
                "Fulfilling Trade",
                vec![
                    EventKind::Gather {
                        resource: owed,
                        source: None,
                        target_amount: Some(shortfall),
                        gathered: 0,
                    },
                    EventKind::TradeFinalize,
                ],
            )
        }
    } else if actor.vitals.hunger < FALLBACK_HUNGER {
        let food = [Resource::Fish, Resource::Coconut]
            .into_iter()
            .find(|f| actor.holding(*f) > 0);
        let step = food.map_or(
            EventKind::Gather {
                resource: Resource::Coconut,
                source: None,
                target_amount: Some(FALLBACK_COCONUTS),
                gathered: 0,
            },
            |resource| EventKind::Consume { resource },
        );
        ("Survive (AI Disabled)", vec![step])
    } else if actor.vitals.energy < FALLBACK_ENERGY {
        ("Survive (AI Disabled)", vec![EventKind::Sleep])
    } else {
        ("Survive (AI Disabled)", vec![EventKind::Idle])
    };
    GoalDecision {
        goal: goal.to_owned(),
        reasoning: String::from("No reasoning backend available. Using basic survival logic."),
        plan,
        memory_entry: Some(String::from("AI is offline. Defaulting to survival mode.")),
    }
}

/// Decision used when a goal call fails.
pub fn failed_goal(error: &ReasonerError) -> GoalDecision {
    GoalDecision {
        goal: String::from("Error"),
        reasoning: format!("Collaborator error: {error}"),
        plan: vec![EventKind::Idle],
        memory_entry: Some(format!("Encountered an error: {error}")),
    }
}

/// Accept when the decider can pay, else reject.
pub fn fallback_trade(request: &TradeRequest) -> TradeDecision {
    if request.decider_can_pay() {
        TradeDecision {
            decision: TradeDecisionKind::Accept,
            reasoning: String::from("AI disabled, accepted fallback."),
            counter_offer: None,
        }
    } else {
        TradeDecision {
            decision: TradeDecisionKind::Reject,
            reasoning: String::from("AI disabled, rejected fallback."),
            counter_offer: None,
        }
    }
}

/// Decision used when a trade call fails.
pub fn failed_trade(error: &ReasonerError) -> TradeDecision {
    TradeDecision {
        decision: TradeDecisionKind::Reject,
        reasoning: format!("Collaborator error: {error}"),
        counter_offer: None,
    }
}

// ---------------------------------------------------------------------------
// Bounded execution
// ---------------------------------------------------------------------------

/// Execute `request` against `reasoner`, never failing.
///
/// Each collaborator call is bounded by `timeout`. Goal and trade failures
/// become [`failed_goal`] / [`failed_trade`]; a failed invention
/// specification yields no draft; a failed icon becomes [`DEFAULT_ICON`].
pub async fn answer(
    reasoner: &dyn Reasoner,
    request: CollaboratorRequest,
    timeout: Duration,
) -> CollaboratorResponse {
    let stamp = request.stamp();
    debug!(backend = reasoner.name(), kind = request.kind(), actor = %stamp.actor, ticket = stamp.ticket, "collaborator call");
    match request {
        CollaboratorRequest::Goal(req) => {
            let decision = bounded(timeout, reasoner.decide_goal(&req))
                .await
                .unwrap_or_else(|error| {
                    warn!(actor = %stamp.actor, %error, "goal decision failed, using fallback");
                    failed_goal(&error)
                });
            CollaboratorResponse::Goal { stamp, decision }
        }
        CollaboratorRequest::Trade(req) => {
            let decision = bounded(timeout, reasoner.decide_trade(&req))
                .await
                .unwrap_or_else(|error| {
                    warn!(actor = %stamp.actor, trade = %req.trade, %error, "trade decision failed, rejecting");
                    failed_trade(&error)
                });
            CollaboratorResponse::Trade {
                stamp,
                trade: req.trade,
                offer: req.offer.clone(),
                decision,
            }
        }
        CollaboratorRequest::Invention(req) => {
            let draft = match bounded(timeout, reasoner.specify_invention(&req)).await {
                Ok(spec) => {
                    let icon = bounded(timeout, reasoner.draw_icon(&spec, &req))
                        .await
                        .unwrap_or_else(|error| {
                            warn!(%error, "icon drawing failed, using default icon");
                            DEFAULT_ICON.to_owned()
                        });
                    Some(Box::new(InventionDraft { spec, icon }))
                }
                Err(error) => {
                    debug!(actor = %stamp.actor, %error, "invention specification failed");
                    None
                }
            };
            CollaboratorResponse::Invention {
                stamp,
                category: req.category,
                draft,
            }
        }
    }
}

async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, ReasonerError>>,
) -> Result<T, ReasonerError> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_elapsed| ReasonerError::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })?
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use castaway_types::{
        Actor, ActorId, InventionCategory, InventionEffect, PendingTrade, Position, Season,
        SimulationEpoch, TradeId, TradeTerms, Vitals,
    };

    use super::*;
    use crate::collaborator::RequestStamp;
    use crate::config::SimulationConfig;

    fn stamp(actor: ActorId) -> RequestStamp {
        RequestStamp {
            epoch: SimulationEpoch::new(),
            ticket: 0,
            actor,
        }
    }

    fn goal_request(energy: f64, hunger: f64) -> GoalRequest {
        let actor = Actor::new("Robinson", Position::new(1, 1), Vitals { energy, hunger });
        GoalRequest {
            stamp: stamp(actor.id),
            actor,
            peer: None,
            objects: Vec::new(),
            inventions: Vec::new(),
            time_label: String::from("Day 1, 01:00"),
            season: Season::Spring,
            config: SimulationConfig::default(),
        }
    }

    fn invention_request() -> InventionRequest {
        InventionRequest {
            stamp: stamp(ActorId::new()),
            category: InventionCategory::ToolImprovement,
            config: SimulationConfig::default(),
        }
    }

    /// A backend that never answers in time and fails everything else.
    struct Stalled;

    #[async_trait]
    impl Reasoner for Stalled {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn decide_goal(&self, _request: &GoalRequest) -> Result<GoalDecision, ReasonerError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(ReasonerError::Disabled)
        }

        async fn decide_trade(
            &self,
            _request: &TradeRequest,
        ) -> Result<TradeDecision, ReasonerError> {
            Err(ReasonerError::Backend {
                message: String::from("connection refused"),
            })
        }

        async fn specify_invention(
            &self,
            _request: &InventionRequest,
        ) -> Result<InventionSpec, ReasonerError> {
            Ok(InventionSpec {
                name: String::from("Fish Trap"),
                description: String::from("Woven reeds."),
                cost: std::collections::BTreeMap::from([(Resource::Wood, 3)]),
                effect: InventionEffect::GatherYieldBonus {
                    resource: Resource::Fish,
                    bonus: 1,
                },
            })
        }

        async fn draw_icon(
            &self,
            _spec: &InventionSpec,
            _request: &InventionRequest,
        ) -> Result<String, ReasonerError> {
            Err(ReasonerError::Malformed {
                reason: String::from("no svg"),
            })
        }
    }

    #[test]
    fn hungry_actor_gathers_coconuts() {
        let decision = fallback_goal(&goal_request(100.0, 40.0));
        assert_eq!(decision.goal, "Survive (AI Disabled)");
        assert!(matches!(
            decision.plan.as_slice(),
            [EventKind::Gather {
                resource: Resource::Coconut,
                target_amount: Some(5),
                ..
            }]
        ));
    }

    #[test]
    fn hungry_actor_with_food_eats() {
        let mut request = goal_request(100.0, 40.0);
        request.actor.inventory.insert(Resource::Coconut, 2);
        let decision = fallback_goal(&request);
        assert_eq!(
            decision.plan,
            vec![EventKind::Consume {
                resource: Resource::Coconut
            }]
        );
    }

    #[test]
    fn rested_and_fed_actor_idles() {
        assert_eq!(fallback_goal(&goal_request(90.0, 90.0)).plan, vec![EventKind::Idle]);
        assert_eq!(fallback_goal(&goal_request(20.0, 90.0)).plan, vec![EventKind::Sleep]);
    }

    #[test]
    fn pending_trade_is_settled_or_gathered_for() {
        let mut request = goal_request(90.0, 90.0);
        request.actor.pending_trade = Some(PendingTrade {
            trade: TradeId::new(),
            partner: ActorId::new(),
            terms: TradeTerms {
                give: Resource::Fish,
                give_amount: 4,
                take: Resource::Wood,
                take_amount: 6,
            },
        });
        request.actor.inventory.insert(Resource::Fish, 1);
        let decision = fallback_goal(&request);
        assert_eq!(decision.goal, "Fulfilling Trade");
        assert!(matches!(
            decision.plan.as_slice(),
            [
                EventKind::Gather {
                    resource: Resource::Fish,
                    target_amount: Some(3),
                    ..
                },
                EventKind::TradeFinalize
            ]
        ));

        request.actor.inventory.insert(Resource::Fish, 4);
        assert_eq!(fallback_goal(&request).plan, vec![EventKind::TradeFinalize]);
    }

    #[tokio::test]
    async fn timed_out_goal_becomes_error_plan() {
        let request = goal_request(90.0, 90.0);
        let response = answer(
            &Stalled,
            CollaboratorRequest::Goal(Box::new(request)),
            Duration::from_millis(10),
        )
        .await;
        match response {
            CollaboratorResponse::Goal { decision, .. } => {
                assert_eq!(decision.goal, "Error");
                assert_eq!(decision.plan, vec![EventKind::Idle]);
                assert!(decision.memory_entry.unwrap().contains("timed out"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_icon_uses_default() {
        let response = answer(
            &Stalled,
            CollaboratorRequest::Invention(Box::new(invention_request())),
            Duration::from_secs(1),
        )
        .await;
        match response {
            CollaboratorResponse::Invention { draft, .. } => {
                let draft = draft.unwrap();
                assert_eq!(draft.spec.name, "Fish Trap");
                assert_eq!(draft.icon, DEFAULT_ICON);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn disabled_backend_yields_no_invention() {
        let response = answer(
            &FallbackReasoner,
            CollaboratorRequest::Invention(Box::new(invention_request())),
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(
            response,
            CollaboratorResponse::Invention { draft: None, .. }
        ));
    }
}
