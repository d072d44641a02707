//! Read-only world context handed to every tactic evaluation.

use overmind_steering::ChokepointCache;
use overmind_types::{AbilityId, AbilityTarget, Agent, Command, Enemy, Point};
use overmind_world::{TerrainOracle, WorldSnapshot};

use crate::config::TacticsConfig;
use crate::error::AbilityError;
use crate::gate;
use crate::reservation::ReservationTable;
use crate::state::TacticalState;

/// Everything a tactic may read this tick.
///
/// The only write channel is the tactic's return value plus the agent's own
/// [`TacticalState`], which the bank passes separately.
#[derive(Clone, Copy)]
pub struct TacticContext<'a> {
    /// Current tick.
    pub tick: u64,
    /// Simulation rate, for converting tick spans into seconds.
    pub ticks_per_second: f64,
    /// This tick's world snapshot.
    pub snapshot: &'a WorldSnapshot,
    /// Terrain oracle.
    pub terrain: &'a dyn TerrainOracle,
    /// Cached chokepoints with threat levels.
    pub chokepoints: &'a ChokepointCache,
    /// Current reservation table, including reservations taken earlier in
    /// this bank pass.
    pub reservations: &'a ReservationTable,
    /// Ability bank configuration.
    pub config: &'a TacticsConfig,
}

impl TacticContext<'_> {
    /// Simulated seconds elapsed since `since`.
    pub fn seconds_since(&self, since: u64) -> f64 {
        let ticks = self.tick.saturating_sub(since);
        let ticks = u32::try_from(ticks).map_or(f64::from(u32::MAX), f64::from);
        if self.ticks_per_second > 0.0 {
            ticks / self.ticks_per_second
        } else {
            0.0
        }
    }

    /// Validate a cast and build its command.
    ///
    /// # Errors
    ///
    /// Returns the [`AbilityError`] explaining why the cast is refused.
    pub fn cast(
        &self,
        agent: &Agent,
        state: &TacticalState,
        ability: AbilityId,
        target: AbilityTarget,
    ) -> Result<Command, AbilityError> {
        gate::check_cast(agent, state, ability, target, self)
    }

    /// Nearest hostile ground unit to `point`, with its distance.
    pub fn nearest_ground_enemy(&self, point: Point) -> Option<(&Enemy, f64)> {
        self.snapshot
            .nearest_enemy(point, |e| !e.is_structure() && e.is_ground())
    }

    /// Number of hostile ground units within `radius` of `point`.
    pub fn ground_enemies_within(&self, point: Point, radius: f64) -> usize {
        self.snapshot.ground_units_within(point, radius).count()
    }

    /// Whether any hostile unit (ground or air) is within `radius` of `point`.
    pub fn any_enemy_unit_within(&self, point: Point, radius: f64) -> bool {
        self.snapshot
            .hostile_units()
            .any(|e| e.position.distance(point) <= radius)
    }
}
