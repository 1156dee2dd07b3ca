//! The LLM-backed [`Reasoner`].
//!
//! Each request is flattened into a template context, rendered into a
//! prompt, sent to the configured backend, and parsed back into the core's
//! decision types. Timeouts and fallbacks are the caller's concern: the
//! core's bounded executor wraps every call.

use std::collections::BTreeMap;

use async_trait::async_trait;
use castaway_core::collaborator::{
    GoalDecision, GoalRequest, InventionRequest, InventionSpec, TradeDecision, TradeRequest,
};
use castaway_core::{Reasoner, ReasonerError};
use castaway_types::{Actor, Resource};
use tracing::debug;

use crate::config::OracleConfig;
use crate::error::OracleError;
use crate::llm::{LlmBackend, create_backend};
use crate::parse;
use crate::prompt::{PromptEngine, PromptKind};

/// A collaborator that asks an LLM.
pub struct LlmReasoner {
    backend: LlmBackend,
    prompts: PromptEngine,
}

impl LlmReasoner {
    /// Build the collaborator, loading prompt templates from disk.
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        Ok(Self {
            backend: create_backend(&config.backend),
            prompts: PromptEngine::new(&config.templates_dir)?,
        })
    }

    /// The backend's display name.
    pub const fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    async fn ask(
        &self,
        kind: PromptKind,
        context: &serde_json::Value,
        temperature: f64,
    ) -> Result<String, OracleError> {
        let prompt = self.prompts.render(kind, context)?;
        let reply = self.backend.complete(&prompt, temperature).await?;
        debug!(kind = ?kind, backend = self.backend.name(), chars = reply.len(), "LLM reply received");
        Ok(reply)
    }
}

#[async_trait]
impl Reasoner for LlmReasoner {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn decide_goal(&self, request: &GoalRequest) -> Result<GoalDecision, ReasonerError> {
        let context = goal_context(request);
        let reply = self
            .ask(PromptKind::Goal, &context, request.config.reasoner.temperature)
            .await?;
        Ok(parse::parse_goal(&reply, request.peer.as_ref().map(|p| p.id))?)
    }

    async fn decide_trade(&self, request: &TradeRequest) -> Result<TradeDecision, ReasonerError> {
        let context = trade_context(request);
        let reply = self
            .ask(PromptKind::Trade, &context, request.config.reasoner.temperature)
            .await?;
        Ok(parse::parse_trade(&reply)?)
    }

    async fn specify_invention(
        &self,
        request: &InventionRequest,
    ) -> Result<InventionSpec, ReasonerError> {
        let context = serde_json::json!({ "category": request.category.label() });
        let reply = self
            .ask(
                PromptKind::Invention,
                &context,
                request.config.reasoner.invention_temperature,
            )
            .await?;
        Ok(parse::parse_invention(&reply)?)
    }

    async fn draw_icon(
        &self,
        spec: &InventionSpec,
        request: &InventionRequest,
    ) -> Result<String, ReasonerError> {
        let context = serde_json::json!({
            "name": spec.name,
            "description": spec.description,
        });
        let reply = self
            .ask(
                PromptKind::Icon,
                &context,
                request.config.reasoner.icon_temperature,
            )
            .await?;
        Ok(parse::parse_icon(&reply)?)
    }
}

// ---------------------------------------------------------------------------
// Template contexts
// ---------------------------------------------------------------------------

fn describe_cost(cost: &BTreeMap<Resource, u32>) -> String {
    if cost.is_empty() {
        return String::from("nothing");
    }
    cost.iter()
        .map(|(resource, amount)| format!("{amount} {resource}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn goal_context(request: &GoalRequest) -> serde_json::Value {
    let actor = &request.actor;
    let config = &request.config;
    let my_inventions: Vec<&str> = request
        .inventions
        .iter()
        .filter(|i| actor.inventions.contains(&i.id))
        .map(|i| i.name.as_str())
        .collect();
    let available: Vec<serde_json::Value> = request
        .available_inventions()
        .map(|i| {
            serde_json::json!({
                "id": i.id.to_string(),
                "name": i.name,
                "description": i.description,
                "cost": describe_cost(&i.cost),
            })
        })
        .collect();
    let peer_name = request.peer.as_ref().map(|p| p.name.clone());
    let pending_trade = request.pending_trade().map(|p| {
        format!(
            "You agreed to give {} {} to {} for {} {}.",
            p.terms.give_amount,
            p.terms.give,
            peer_name.as_deref().unwrap_or("your partner"),
            p.terms.take_amount,
            p.terms.take
        )
    });
    let last_trade = actor.long_term_memory.last_trade.as_ref().map(|t| {
        format!("{} ({})", t.details, t.outcome)
    });

    serde_json::json!({
        "name": actor.name,
        "peer": peer_name,
        "time": request.time_label,
        "season": format!("{:?}", request.season),
        "energy": format!("{:.1}", actor.vitals.energy),
        "max_energy": format!("{:.0}", config.vitals.max_energy),
        "hunger": format!("{:.1}", actor.vitals.hunger),
        "max_hunger": format!("{:.0}", config.vitals.max_hunger),
        "inventory": actor.inventory,
        "tools": actor.tools,
        "my_inventions": my_inventions,
        "goal": actor.goal,
        "pending_trade": pending_trade,
        "housing": actor.long_term_memory.housing.to_string(),
        "tool_status": actor.long_term_memory.tools.to_string(),
        "last_trade": last_trade,
        "short_term_memory": actor.short_term_memory,
        "shelter_cost": describe_cost(&config.costs.shelter),
        "axe_cost": describe_cost(&config.costs.axe),
        "available_inventions": available,
        "critical": request.is_critical(),
    })
}

fn productivity_report(decider: &Actor, counterpart: &Actor) -> Vec<serde_json::Value> {
    Resource::GATHERABLE
        .iter()
        .map(|resource| {
            serde_json::json!({
                "resource": resource.to_string(),
                "mine": format!("{:.1}", decider.productivity_for(*resource)),
                "theirs": format!("{:.1}", counterpart.productivity_for(*resource)),
            })
        })
        .collect()
}

fn trade_context(request: &TradeRequest) -> serde_json::Value {
    let decider = &request.decider;
    let vitals = &request.config.vitals;
    let terms = request.offer.terms;
    serde_json::json!({
        "name": decider.name,
        "peer": request.counterpart.name,
        "counterpart": request.counterpart.name,
        "energy": format!("{:.1}", decider.vitals.energy),
        "max_energy": format!("{:.0}", vitals.max_energy),
        "energy_decay": vitals.energy_decay_rate,
        "hunger": format!("{:.1}", decider.vitals.hunger),
        "max_hunger": format!("{:.0}", vitals.max_hunger),
        "hunger_decay": vitals.hunger_decay_rate,
        "inventory": decider.inventory,
        "offer": {
            "give": terms.give.to_string(),
            "give_amount": terms.give_amount,
            "take": terms.take.to_string(),
            "take_amount": terms.take_amount,
            "turn": request.offer.turn,
        },
        "max_turns": request.config.trade.max_negotiation_turns,
        "productivity": productivity_report(decider, &request.counterpart),
    })
}
