//! The user-visible event log.
//!
//! This is simulation state, separate from `tracing` output. Repeated
//! messages about the same actor collapse into one entry with a count, and
//! only the most recent entries are kept.

use std::collections::VecDeque;

use castaway_types::{ActorId, LogEntry, LogKind};
use chrono::Utc;
use tracing::debug;

use crate::clock::WorldClock;

/// Bounded, de-duplicating log of simulation happenings.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_sequence: u64,
}

impl EventLog {
    /// An empty log keeping at most `capacity` entries.
    pub const fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            next_sequence: 0,
        }
    }

    /// Record `message`.
    ///
    /// When `actor` is set and that actor's most recent entry has the same
    /// message and kind, its count is bumped and its time refreshed instead
    /// of appending.
    pub fn push(
        &mut self,
        clock: &WorldClock,
        kind: LogKind,
        actor: Option<ActorId>,
        message: impl Into<String>,
    ) {
        let message = message.into();
        debug!(tick = clock.tick(), ?kind, actor = ?actor, %message, "log");

        let repeat = actor.and_then(|id| {
            self.entries
                .iter_mut()
                .rev()
                .find(|e| e.actor == Some(id))
                .filter(|last| last.message == message && last.kind == kind)
        });
        if let Some(last) = repeat {
            last.count = last.count.saturating_add(1);
            last.tick = clock.tick();
            last.time_label = clock.label();
            return;
        }

        let entry = LogEntry {
            sequence: self.next_sequence,
            tick: clock.tick(),
            time_label: clock.label(),
            message,
            kind,
            actor,
            count: 1,
            recorded_at: Utc::now(),
        };
        self.next_sequence = self.next_sequence.saturating_add(1);
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// The most recent entry.
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any retained entry contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }
}
