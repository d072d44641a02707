//! Per-agent tactical state and the arena that owns it.
//!
//! The [`TacticalArena`] maps each agent tag to a small [`TacticalState`] of
//! optional mode fields. Entries are created the first time a tag is
//! observed, mutated only by the ability bank, and evicted by the scheduler
//! once the tag disappears from the snapshot.

use std::collections::{BTreeMap, BTreeSet};

use overmind_types::{AbilityId, Point, UnitTag};
use serde::{Deserialize, Serialize};

/// Phase of the land-mine ambush state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MinePhase {
    /// No slot assigned.
    #[default]
    Unassigned,
    /// Travelling to a reserved slot.
    Deploying,
    /// Burrowed on station.
    Armed,
}

/// Ephemeral tactical mode flags for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticalState {
    /// The agent this state belongs to.
    pub tag: UnitTag,
    /// Tick the agent was first observed.
    pub first_seen: u64,
    /// Tick the agent was last observed.
    pub last_seen: u64,
    /// Tick regeneration started, while regenerating.
    pub regenerating_since: Option<u64>,
    /// Tick regeneration last ended.
    pub regen_exited_at: Option<u64>,
    /// Current area-denial or infiltration destination.
    pub infiltration_target: Option<Point>,
    /// Whether the agent is escaping to base at low health.
    pub escaping: bool,
    /// Slot of the agent's current mine reservation.
    pub active_mine_position: Option<Point>,
    /// Land-mine phase.
    pub mine_phase: MinePhase,
    /// Tick of the most recent successful cast per ability.
    pub last_cast: BTreeMap<AbilityId, u64>,
}

impl TacticalState {
    /// Fresh state for an agent first seen at `tick`.
    pub const fn new(tag: UnitTag, tick: u64) -> Self {
        Self {
            tag,
            first_seen: tick,
            last_seen: tick,
            regenerating_since: None,
            regen_exited_at: None,
            infiltration_target: None,
            escaping: false,
            active_mine_position: None,
            mine_phase: MinePhase::Unassigned,
            last_cast: BTreeMap::new(),
        }
    }

    /// Whether the regen dance currently holds the agent.
    pub const fn is_regenerating(&self) -> bool {
        self.regenerating_since.is_some()
    }

    /// Whether a tactical mode owns this agent's movement.
    ///
    /// The movement stage leaves held agents alone between ability cadences
    /// so their last tactical order stands.
    pub fn is_held(&self) -> bool {
        self.is_regenerating()
            || self.escaping
            || self.mine_phase != MinePhase::Unassigned
            || self.infiltration_target.is_some()
    }

    /// Forget the mine slot and return to `Unassigned`.
    pub const fn reset_mine(&mut self) {
        self.mine_phase = MinePhase::Unassigned;
        self.active_mine_position = None;
    }

    /// Record a successful cast.
    pub fn record_cast(&mut self, ability: AbilityId, tick: u64) {
        self.last_cast.insert(ability, tick);
    }

    /// Ticks since `ability` was last cast, if ever.
    pub fn ticks_since_cast(&self, ability: AbilityId, tick: u64) -> Option<u64> {
        self.last_cast
            .get(&ability)
            .map(|&cast| tick.saturating_sub(cast))
    }

    /// Ticks since either burrow toggle was last cast, if ever.
    pub fn ticks_since_burrow_toggle(&self, tick: u64) -> Option<u64> {
        [AbilityId::BurrowDown, AbilityId::BurrowUp]
            .into_iter()
            .filter_map(|ability| self.ticks_since_cast(ability, tick))
            .min()
    }
}

/// Tactical state for every observed agent.
#[derive(Debug, Clone, Default)]
pub struct TacticalArena {
    states: BTreeMap<UnitTag, TacticalState>,
}

impl TacticalArena {
    /// Create an empty arena.
    pub const fn new() -> Self {
        Self {
            states: BTreeMap::new(),
        }
    }

    /// Register every tag observed at `tick`, creating missing entries and
    /// bumping `last_seen`. Returns how many entries were created.
    pub fn observe<I>(&mut self, tags: I, tick: u64) -> usize
    where
        I: IntoIterator<Item = UnitTag>,
    {
        let mut created: usize = 0;
        for tag in tags {
            let state = self.states.entry(tag).or_insert_with(|| {
                created = created.saturating_add(1);
                TacticalState::new(tag, tick)
            });
            state.last_seen = tick;
        }
        created
    }

    /// The state for `tag`, if observed.
    pub fn get(&self, tag: UnitTag) -> Option<&TacticalState> {
        self.states.get(&tag)
    }

    /// Mutable state for `tag`, created if missing.
    pub fn entry(&mut self, tag: UnitTag, tick: u64) -> &mut TacticalState {
        self.states
            .entry(tag)
            .or_insert_with(|| TacticalState::new(tag, tick))
    }

    /// Whether a tactical mode holds `tag`'s movement.
    pub fn is_held(&self, tag: UnitTag) -> bool {
        self.states.get(&tag).is_some_and(TacticalState::is_held)
    }

    /// Evict entries whose tag is not in `present`. Returns the evicted tags.
    pub fn prune(&mut self, present: &BTreeSet<UnitTag>) -> Vec<UnitTag> {
        let gone: Vec<UnitTag> = self
            .states
            .keys()
            .filter(|tag| !present.contains(tag))
            .copied()
            .collect();
        for tag in &gone {
            self.states.remove(tag);
        }
        gone
    }

    /// Number of tracked agents.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no agents are tracked.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// All states in tag order.
    pub fn iter(&self) -> impl Iterator<Item = &TacticalState> {
        self.states.values()
    }
}
