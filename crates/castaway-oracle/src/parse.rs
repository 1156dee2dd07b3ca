//! LLM response parsing into typed collaborator answers.
//!
//! The LLM returns raw text (ideally JSON). This module extracts the JSON
//! object, tolerating markdown fences, surrounding prose and trailing
//! commas, then validates it into the core's decision types. Individual
//! plan steps that cannot be understood become `IDLE` so one bad step does
//! not discard an otherwise usable plan.

use std::collections::BTreeMap;

use castaway_core::collaborator::{GoalDecision, InventionSpec, TradeDecision};
use castaway_types::{
    ActorId, EventKind, InventionEffect, InventionId, Resource, TradeDecisionKind, TradeTerms,
    VitalStat,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::OracleError;

// ---------------------------------------------------------------------------
// Raw shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGoal {
    goal: String,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    plan: Vec<RawStep>,
    #[serde(default)]
    memory_entry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    action: String,
    #[serde(default)]
    parameters: Option<RawParameters>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParameters {
    resource: Option<String>,
    amount: Option<f64>,
    give_resource: Option<String>,
    give_amount: Option<f64>,
    take_resource: Option<String>,
    take_amount: Option<f64>,
    invention_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrade {
    decision: String,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    counter_offer: Option<RawParameters>,
}

#[derive(Debug, Deserialize)]
struct RawInvention {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    cost: BTreeMap<String, Option<f64>>,
    effect: RawEffect,
}

#[derive(Debug, Deserialize)]
struct RawEffect {
    #[serde(rename = "type")]
    kind: String,
    resource: Option<String>,
    stat: Option<String>,
    multiplier: Option<f64>,
    bonus: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawIcon {
    svg: String,
}

// ---------------------------------------------------------------------------
// Public parsers
// ---------------------------------------------------------------------------

/// Parse a goal decision. `partner` is the actor a `TRADE_INITIATE` step
/// proposes to.
pub fn parse_goal(raw: &str, partner: Option<ActorId>) -> Result<GoalDecision, OracleError> {
    let parsed: RawGoal = extract_json(raw)?;
    let plan = parsed
        .plan
        .into_iter()
        .map(|step| {
            let action = step.action.clone();
            convert_step(step, partner).unwrap_or_else(|error| {
                warn!(%action, %error, "unusable plan step, substituting IDLE");
                EventKind::Idle
            })
        })
        .collect();
    Ok(GoalDecision {
        goal: parsed.goal,
        reasoning: parsed.reasoning,
        plan,
        memory_entry: parsed.memory_entry,
    })
}

/// Parse a trade decision. A counter without usable terms is kept as a
/// counter with no offer, which the negotiation treats as a breakdown.
pub fn parse_trade(raw: &str) -> Result<TradeDecision, OracleError> {
    let parsed: RawTrade = extract_json(raw)?;
    let decision = parse_decision(&parsed.decision)?;
    let counter_offer = if decision == TradeDecisionKind::Counter {
        parsed
            .counter_offer
            .as_ref()
            .and_then(|offer| trade_terms(offer).ok())
    } else {
        None
    };
    Ok(TradeDecision {
        decision,
        reasoning: parsed.reasoning,
        counter_offer,
    })
}

/// Parse an invention specification.
pub fn parse_invention(raw: &str) -> Result<InventionSpec, OracleError> {
    let parsed: RawInvention = extract_json(raw)?;
    let name = parsed.name.trim().to_owned();
    if name.is_empty() {
        return Err(OracleError::Parse("invention has no name".to_owned()));
    }

    let mut cost = BTreeMap::new();
    for (resource, amount) in parsed.cost {
        let Some(amount) = amount.and_then(whole).filter(|a| *a > 0) else {
            continue;
        };
        cost.insert(parse_resource(&resource)?, amount);
    }

    Ok(InventionSpec {
        name,
        description: parsed.description,
        cost,
        effect: convert_effect(&parsed.effect)?,
    })
}

/// Parse an icon answer into SVG path markup.
pub fn parse_icon(raw: &str) -> Result<String, OracleError> {
    let parsed: RawIcon = extract_json(raw)?;
    let svg = parsed.svg.trim();
    if svg.contains("<path") {
        Ok(svg.to_owned())
    } else {
        Err(OracleError::Parse("icon contains no <path> element".to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

fn convert_step(step: RawStep, partner: Option<ActorId>) -> Result<EventKind, OracleError> {
    let params = step.parameters.unwrap_or_default();
    let action = step.action.trim().to_uppercase().replace([' ', '-'], "_");
    match action.as_str() {
        "GATHER" => {
            let resource = required_resource(params.resource.as_deref(), "GATHER")?;
            if !Resource::GATHERABLE.contains(&resource) {
                return Err(OracleError::Parse(format!("{resource} cannot be gathered")));
            }
            Ok(EventKind::Gather {
                resource,
                source: None,
                target_amount: params.amount.and_then(whole).filter(|a| *a > 0),
                gathered: 0,
            })
        }
        "CONSUME" | "EAT" => Ok(EventKind::Consume {
            resource: required_resource(params.resource.as_deref(), "CONSUME")?,
        }),
        "SLEEP" | "REST" => Ok(EventKind::Sleep),
        "IDLE" => Ok(EventKind::Idle),
        "CRAFT_AXE" => Ok(EventKind::CraftAxe),
        "BUILD_SHELTER" => Ok(EventKind::BuildShelter),
        "TRADE_FINALIZE" => Ok(EventKind::TradeFinalize),
        "BUILD_INVENTION" => {
            let id = params
                .invention_id
                .as_deref()
                .ok_or_else(|| OracleError::Parse("BUILD_INVENTION requires 'inventionId'".to_owned()))?;
            let uuid = uuid::Uuid::parse_str(id.trim())
                .map_err(|e| OracleError::Parse(format!("invalid inventionId: {e}")))?;
            Ok(EventKind::BuildInvention {
                invention: InventionId::from(uuid),
            })
        }
        "TRADE_INITIATE" => {
            let partner = partner
                .ok_or_else(|| OracleError::Parse("no one to trade with".to_owned()))?;
            Ok(EventKind::TradeInitiate {
                partner,
                terms: trade_terms(&params)?,
            })
        }
        other => Err(OracleError::Parse(format!("unknown action: {other}"))),
    }
}

fn trade_terms(params: &RawParameters) -> Result<TradeTerms, OracleError> {
    let amount = |value: Option<f64>, field: &str| {
        value
            .and_then(whole)
            .filter(|a| *a > 0)
            .ok_or_else(|| OracleError::Parse(format!("trade requires a positive '{field}'")))
    };
    Ok(TradeTerms {
        give: required_resource(params.give_resource.as_deref(), "giveResource")?,
        give_amount: amount(params.give_amount, "giveAmount")?,
        take: required_resource(params.take_resource.as_deref(), "takeResource")?,
        take_amount: amount(params.take_amount, "takeAmount")?,
    })
}

fn convert_effect(raw: &RawEffect) -> Result<InventionEffect, OracleError> {
    let multiplier = || {
        raw.multiplier
            .filter(|m| m.is_finite() && *m > 0.0)
            .ok_or_else(|| OracleError::Parse("effect requires a positive 'multiplier'".to_owned()))
    };
    match raw.kind.trim().to_uppercase().as_str() {
        "PRODUCTIVITY_BOOST" => Ok(InventionEffect::ProductivityBoost {
            resource: required_resource(raw.resource.as_deref(), "resource")?,
            multiplier: multiplier()?,
        }),
        "STAT_DECAY_MODIFIER" => {
            let stat = match raw.stat.as_deref().map(str::to_lowercase).as_deref() {
                Some("hunger") => VitalStat::Hunger,
                Some("energy") => VitalStat::Energy,
                other => {
                    return Err(OracleError::Parse(format!("invalid stat: {other:?}")));
                }
            };
            Ok(InventionEffect::StatDecayModifier {
                stat,
                multiplier: multiplier()?,
            })
        }
        "GATHER_YIELD_BONUS" => Ok(InventionEffect::GatherYieldBonus {
            resource: required_resource(raw.resource.as_deref(), "resource")?,
            bonus: raw
                .bonus
                .and_then(whole)
                .ok_or_else(|| OracleError::Parse("effect requires a 'bonus'".to_owned()))?,
        }),
        other => Err(OracleError::Parse(format!("unknown effect type: {other}"))),
    }
}

fn parse_decision(s: &str) -> Result<TradeDecisionKind, OracleError> {
    match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
        "accept" => Ok(TradeDecisionKind::Accept),
        "reject" => Ok(TradeDecisionKind::Reject),
        "counter" => Ok(TradeDecisionKind::Counter),
        "accept_and_gather" | "acceptandgather" => Ok(TradeDecisionKind::AcceptAndGather),
        other => Err(OracleError::Parse(format!("unknown trade decision: {other}"))),
    }
}

fn required_resource(value: Option<&str>, field: &str) -> Result<Resource, OracleError> {
    let value =
        value.ok_or_else(|| OracleError::Parse(format!("missing '{field}' parameter")))?;
    parse_resource(value)
}

fn parse_resource(s: &str) -> Result<Resource, OracleError> {
    match s.trim().to_lowercase().as_str() {
        "wood" => Ok(Resource::Wood),
        "stone" => Ok(Resource::Stone),
        "coconut" | "coconuts" => Ok(Resource::Coconut),
        "fish" => Ok(Resource::Fish),
        "axe" => Ok(Resource::Axe),
        "shelter" => Ok(Resource::Shelter),
        other => Err(OracleError::Parse(format!("unknown resource: {other}"))),
    }
}

/// Round a JSON number to a non-negative whole quantity.
fn whole(value: f64) -> Option<u32> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < 0.0 || rounded > f64::from(u32::MAX) {
        return None;
    }
    // Safe: 0 <= rounded <= u32::MAX and it has no fractional part.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let result = rounded as u32;
    Some(result)
}

// ---------------------------------------------------------------------------
// JSON recovery
// ---------------------------------------------------------------------------

/// Deserialize the JSON object in `raw` through several recovery strategies:
///
/// 1. Direct `serde_json` deserialization
/// 2. Extract JSON from a markdown code block
/// 3. The outermost `{ ... }` span
///
/// each tried as-is and with trailing commas stripped.
fn extract_json<T: DeserializeOwned>(raw: &str) -> Result<T, OracleError> {
    let trimmed = raw.trim();
    let candidates = [
        Some(trimmed),
        extract_json_from_codeblock(trimmed),
        outermost_object(trimmed),
    ];
    for candidate in candidates.into_iter().flatten() {
        if let Ok(parsed) = serde_json::from_str::<T>(candidate) {
            return Ok(parsed);
        }
        if let Ok(parsed) = serde_json::from_str::<T>(&strip_trailing_commas(candidate)) {
            return Ok(parsed);
        }
    }
    Err(OracleError::Parse(format!(
        "all parse strategies failed for: {trimmed}"
    )))
}

/// Extract JSON from a markdown code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let fence = text.find("```")?;
    let after_fence = fence.checked_add(3)?;
    let body_start = text
        .get(after_fence..)
        .and_then(|s| s.find('\n'))
        .and_then(|nl| after_fence.checked_add(nl))
        .and_then(|pos| pos.checked_add(1))
        .unwrap_or(after_fence);
    let remaining = text.get(body_start..)?;
    let end = remaining.find("```")?;
    remaining.get(..end).map(str::trim)
}

/// The text between the first `{` and the last `}`.
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

/// Strip trailing commas before closing braces and brackets (common LLM error).
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ',' {
            let rest: String = chars.clone().skip_while(|n| n.is_whitespace()).take(1).collect();
            if rest == "}" || rest == "]" {
                continue;
            }
        }
        result.push(c);
    }
    result
}
