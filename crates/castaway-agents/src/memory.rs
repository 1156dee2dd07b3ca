//! Actor memory updates.
//!
//! Short-term memory is a most-recent-first list of free-text notes capped
//! at a configured length; the oldest notes fall off the end. Long-term
//! memory holds a handful of durable facts (housing, tools, last trade).

use castaway_types::{Actor, ActorId, HousingStatus, LastTrade, ToolStatus, TradeStatus};

/// Prepend `note` to the actor's short-term memory, keeping at most
/// `capacity` entries.
pub fn remember(actor: &mut Actor, note: impl Into<String>, capacity: usize) {
    actor.short_term_memory.push_front(note.into());
    actor.short_term_memory.truncate(capacity);
}

/// Record a housing change alongside a note.
pub fn remember_housing(
    actor: &mut Actor,
    note: impl Into<String>,
    housing: HousingStatus,
    capacity: usize,
) {
    remember(actor, note, capacity);
    actor.long_term_memory.housing = housing;
}

/// Record a tool change alongside a note.
pub fn remember_tools(actor: &mut Actor, note: impl Into<String>, tools: ToolStatus, capacity: usize) {
    remember(actor, note, capacity);
    actor.long_term_memory.tools = tools;
}

/// Record how a trade with `partner` ended.
pub fn remember_trade(
    actor: &mut Actor,
    partner: ActorId,
    partner_name: &str,
    outcome: TradeStatus,
    details: String,
    capacity: usize,
) {
    remember(
        actor,
        format!("Trade with {partner_name} finished: {}.", outcome.to_string().to_uppercase()),
        capacity,
    );
    actor.long_term_memory.last_trade = Some(LastTrade {
        partner,
        outcome,
        details,
    });
}

#[cfg(test)]
mod tests {
    use castaway_types::{Position, Vitals};

    use super::*;

    fn actor() -> Actor {
        Actor::new(
            "Robinson",
            Position::new(0, 0),
            Vitals {
                energy: 100.0,
                hunger: 80.0,
            },
        )
    }

    #[test]
    fn newest_note_first_and_capped() {
        let mut a = actor();
        for i in 0..5 {
            remember(&mut a, format!("note {i}"), 3);
        }
        let notes: Vec<&str> = a.short_term_memory.iter().map(String::as_str).collect();
        assert_eq!(notes, vec!["note 4", "note 3", "note 2"]);
    }

    #[test]
    fn trade_outcome_is_durable() {
        let mut a = actor();
        let partner = ActorId::new();
        remember_trade(
            &mut a,
            partner,
            "Friday",
            TradeStatus::Failed,
            String::from("Gave 5 Wood for 3 Stone"),
            10,
        );
        assert_eq!(
            a.short_term_memory.front().map(String::as_str),
            Some("Trade with Friday finished: FAILED.")
        );
        let last = a.long_term_memory.last_trade.as_ref();
        assert_eq!(last.map(|t| t.outcome), Some(TradeStatus::Failed));
        assert_eq!(last.map(|t| t.partner), Some(partner));
    }

    #[test]
    fn tool_status_follows_note() {
        let mut a = actor();
        remember_tools(&mut a, "My axe broke!", ToolStatus::NoTools, 10);
        assert_eq!(a.long_term_memory.tools, ToolStatus::NoTools);
        remember_housing(&mut a, "I built a new shelter.", HousingStatus::HasShelter, 10);
        assert_eq!(a.long_term_memory.housing, HousingStatus::HasShelter);
        assert_eq!(a.short_term_memory.len(), 2);
    }
}
