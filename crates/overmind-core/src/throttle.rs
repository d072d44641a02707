//! Throttled logging for per-agent failures.
//!
//! A unit stuck against a cliff fails the same way every tick; logging each
//! one would drown the tick summary. [`LogThrottle`] lets one event per
//! `(tag, kind)` through per window and counts what it swallowed, so the next
//! admitted event can report how many were suppressed.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use overmind_types::UnitTag;

#[derive(Debug, Clone, Copy)]
struct Slot {
    last_emitted: u64,
    suppressed: u64,
}

/// Rate limiter keyed by agent tag and error kind.
///
/// Tick-level events that belong to no agent (a failed observation) are
/// keyed by kind alone and survive pruning.
#[derive(Debug, Clone)]
pub struct LogThrottle {
    window: u64,
    slots: BTreeMap<(UnitTag, &'static str), Slot>,
    tick_slots: BTreeMap<&'static str, Slot>,
    suppressed_total: u64,
}

impl LogThrottle {
    /// A throttle admitting one event per key every `window` ticks.
    pub const fn new(window: u64) -> Self {
        Self {
            window,
            slots: BTreeMap::new(),
            tick_slots: BTreeMap::new(),
            suppressed_total: 0,
        }
    }

    /// Decide whether an event for `(tag, kind)` at `tick` should be logged.
    ///
    /// Returns `Some(n)` when it should, where `n` is the number of events
    /// suppressed for this key since the last one logged, and `None` when it
    /// falls inside the window.
    pub fn admit(&mut self, tag: UnitTag, kind: &'static str, tick: u64) -> Option<u64> {
        let admitted = admit_slot(self.slots.entry((tag, kind)), tick, self.window);
        self.count(admitted)
    }

    /// Same as [`LogThrottle::admit`] for an event not tied to any agent.
    pub fn admit_tick_event(&mut self, kind: &'static str, tick: u64) -> Option<u64> {
        let admitted = admit_slot(self.tick_slots.entry(kind), tick, self.window);
        self.count(admitted)
    }

    fn count(&mut self, admitted: Option<u64>) -> Option<u64> {
        if admitted.is_none() {
            self.suppressed_total = self.suppressed_total.saturating_add(1);
        }
        admitted
    }

    /// Forget keys for agents no longer present.
    pub fn prune(&mut self, present: &BTreeSet<UnitTag>) {
        self.slots.retain(|(tag, _), _| present.contains(tag));
    }

    /// Events swallowed since creation.
    pub const fn suppressed_total(&self) -> u64 {
        self.suppressed_total
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn admit_slot<K: Ord>(entry: Entry<'_, K, Slot>, tick: u64, window: u64) -> Option<u64> {
    match entry {
        Entry::Occupied(mut occupied) => {
            let slot = occupied.get_mut();
            if tick.saturating_sub(slot.last_emitted) < window {
                slot.suppressed = slot.suppressed.saturating_add(1);
                return None;
            }
            let suppressed = slot.suppressed;
            *slot = Slot {
                last_emitted: tick,
                suppressed: 0,
            };
            Some(suppressed)
        }
        Entry::Vacant(vacant) => {
            vacant.insert(Slot {
                last_emitted: tick,
                suppressed: 0,
            });
            Some(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_event_per_window_per_key() {
        let mut throttle = LogThrottle::new(10);
        let tag = UnitTag::new(1);
        assert_eq!(throttle.admit(tag, "untraversable", 0), Some(0));
        assert_eq!(throttle.admit(tag, "untraversable", 3), None);
        assert_eq!(throttle.admit(tag, "untraversable", 9), None);
        assert_eq!(throttle.admit(tag, "untraversable", 10), Some(2));
        assert_eq!(throttle.suppressed_total(), 2);
    }

    #[test]
    fn kinds_and_tags_are_independent() {
        let mut throttle = LogThrottle::new(10);
        assert_eq!(throttle.admit(UnitTag::new(1), "on_cooldown", 0), Some(0));
        assert_eq!(throttle.admit(UnitTag::new(1), "non_finite", 1), Some(0));
        assert_eq!(throttle.admit(UnitTag::new(2), "on_cooldown", 1), Some(0));
        assert_eq!(throttle.len(), 3);
    }

    #[test]
    fn prune_drops_absent_agents() {
        let mut throttle = LogThrottle::new(10);
        throttle.admit(UnitTag::new(1), "on_cooldown", 0);
        throttle.admit(UnitTag::new(2), "on_cooldown", 0);
        let present: BTreeSet<UnitTag> = [UnitTag::new(2)].into_iter().collect();
        throttle.prune(&present);
        assert_eq!(throttle.len(), 1);
    }

    #[test]
    fn tick_events_survive_pruning() {
        let mut throttle = LogThrottle::new(10);
        assert_eq!(throttle.admit_tick_event("observation", 0), Some(0));
        throttle.prune(&BTreeSet::new());
        assert_eq!(throttle.admit_tick_event("observation", 4), None);
        assert_eq!(throttle.admit_tick_event("observation", 12), Some(1));
        assert_eq!(throttle.suppressed_total(), 1);
    }
}
