//! The event queue: FIFO with targeted front-insertion.
//!
//! Events are appended by default. Front-insertion splices a prerequisite
//! (a move before a gather, a counter-offer) ahead of everything else. The
//! queue never holds two decide-goal events for the same actor; every
//! decide-goal goes through [`EventQueue::queue_decide`].

use std::collections::VecDeque;

use castaway_types::{ActorId, Event, EventKind};

/// Ordered pending intents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    /// An empty queue.
    pub const fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    /// Append `event`, or prepend it when `to_front` is set.
    ///
    /// Decide-goal events are routed through [`Self::queue_decide`].
    pub fn queue(&mut self, event: Event, to_front: bool) {
        if event.is_decide() {
            self.queue_decide(event.actor, to_front);
        } else if to_front {
            self.events.push_front(event);
        } else {
            self.events.push_back(event);
        }
    }

    /// Queue a decide-goal for `actor`, keeping at most one per actor.
    ///
    /// Appending is a no-op when one is already queued. Prepending moves the
    /// existing one to the front. Returns whether the queue changed.
    pub fn queue_decide(&mut self, actor: ActorId, to_front: bool) -> bool {
        let existing = self.position_of_decide(actor);
        if to_front {
            if existing == Some(0) {
                return false;
            }
            if let Some(idx) = existing {
                self.events.remove(idx);
            }
            self.events.push_front(Event::decide(actor));
            true
        } else if existing.is_some() {
            false
        } else {
            self.events.push_back(Event::decide(actor));
            true
        }
    }

    /// The next event to process.
    pub fn head(&self) -> Option<&Event> {
        self.events.front()
    }

    /// Remove and return the head.
    pub fn pop_head(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Pop the head and, if given, prepend `successor` in its place.
    pub fn replace_head(&mut self, successor: Option<Event>) -> Option<Event> {
        let head = self.events.pop_front();
        if let Some(next) = successor {
            self.queue(next, true);
        }
        head
    }

    /// Move the head to the tail.
    ///
    /// A decide-goal head is dropped instead when the same actor already has
    /// another decide-goal further back.
    pub fn postpone_head(&mut self) {
        let Some(head) = self.events.pop_front() else {
            return;
        };
        if head.is_decide() && self.has_decide_for(head.actor) {
            return;
        }
        self.events.push_back(head);
    }

    /// Whether any event belongs to `actor`.
    pub fn has_event_for(&self, actor: ActorId) -> bool {
        self.events.iter().any(|e| e.actor == actor)
    }

    /// Whether a decide-goal for `actor` is queued.
    pub fn has_decide_for(&self, actor: ActorId) -> bool {
        self.position_of_decide(actor).is_some()
    }

    /// Drop every event owned by `actor`. Returns how many were removed.
    pub fn remove_actor(&mut self, actor: ActorId) -> usize {
        let before = self.events.len();
        self.events.retain(|e| e.actor != actor);
        before.saturating_sub(self.events.len())
    }

    /// Number of decide-goal events queued for `actor`.
    pub fn decide_count(&self, actor: ActorId) -> usize {
        self.events
            .iter()
            .filter(|e| e.actor == actor && matches!(e.kind, EventKind::DecideGoal))
            .count()
    }

    /// Events in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn position_of_decide(&self, actor: ActorId) -> Option<usize> {
        self.events
            .iter()
            .position(|e| e.actor == actor && e.is_decide())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sleep(actor: ActorId) -> Event {
        Event::new(actor, EventKind::Sleep)
    }

    #[test]
    fn append_and_prepend() {
        let a = ActorId::new();
        let mut q = EventQueue::new();
        q.queue(sleep(a), false);
        q.queue(Event::new(a, EventKind::CraftAxe), true);
        assert_eq!(q.head().map(|e| e.kind.name()), Some("CRAFT_AXE"));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn at_most_one_decide_per_actor() {
        let (a, b) = (ActorId::new(), ActorId::new());
        let mut q = EventQueue::new();
        assert!(q.queue_decide(a, false));
        assert!(!q.queue_decide(a, false));
        q.queue(Event::decide(a), false);
        q.queue(Event::decide(b), false);
        q.queue(Event::decide(a), true);
        assert_eq!(q.decide_count(a), 1);
        assert_eq!(q.decide_count(b), 1);
        assert_eq!(q.head().map(|e| e.actor), Some(a));
    }

    #[test]
    fn replace_head_splices_successor() {
        let a = ActorId::new();
        let mut q = EventQueue::new();
        q.queue(Event::new(a, EventKind::BuildShelter), false);
        q.queue(sleep(a), false);
        let popped = q.replace_head(Some(Event::new(a, EventKind::CraftAxe)));
        assert_eq!(popped.map(|e| e.kind), Some(EventKind::BuildShelter));
        let order: Vec<_> = q.iter().map(|e| e.kind.name()).collect();
        assert_eq!(order, vec!["CRAFT_AXE", "SLEEP"]);

        q.replace_head(None);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn postponed_decide_moves_to_tail() {
        let (a, b) = (ActorId::new(), ActorId::new());
        let mut q = EventQueue::new();
        q.queue_decide(a, false);
        q.queue(sleep(b), false);
        q.postpone_head();
        let order: Vec<_> = q.iter().map(|e| e.actor).collect();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn remove_actor_drops_only_theirs() {
        let (a, b) = (ActorId::new(), ActorId::new());
        let mut q = EventQueue::new();
        q.queue(sleep(a), false);
        q.queue(sleep(b), false);
        q.queue_decide(a, false);
        assert_eq!(q.remove_actor(a), 2);
        assert!(!q.has_event_for(a));
        assert!(q.has_event_for(b));
    }
}
