//! The full per-agent movement computation.
//!
//! [`SteeringEngine::plan`] gathers this agent's inputs from the snapshot,
//! runs the aggregator, the potential field, and the formation controller,
//! and turns the bounded result into a target position:
//!
//! 1. Neighborhood, nearby enemies, enemy centroid, chokepoint modifier and
//!    splash distance are read from the snapshot and the chokepoint cache.
//! 2. Flocking forces and repulsion are summed and clamped to `max_force`.
//! 3. The clamped force becomes an offset of at most `max_speed`.
//! 4. Ranged ground agents blend that raw target toward their concave anchor.
//!
//! Missing terrain data only disables terrain repulsion. A non-finite result
//! or an untraversable ground target is an error; the caller then runs
//! [`SteeringEngine::spacing_only`].

use overmind_types::{Agent, Enemy, Point, Vec2};
use overmind_world::{TerrainOracle, WorldSnapshot};

use crate::boids::{ForceBreakdown, ForceInput, SpatialForceAggregator, sanitize};
use crate::config::{FormationConfig, PotentialConfig, SteeringConfig};
use crate::error::SteeringError;
use crate::formation::{ChokepointCache, FormationController};
use crate::potential::{PotentialBreakdown, PotentialField, PotentialInput};

/// The outcome of one agent's movement computation.
#[derive(Debug, Clone, PartialEq)]
pub struct SteeringPlan {
    /// Flocking terms.
    pub forces: ForceBreakdown,
    /// Repulsion terms.
    pub repulsion: PotentialBreakdown,
    /// Combined force, clamped to `max_force`.
    pub total: Vec2,
    /// Position implied by the force alone.
    pub raw_target: Point,
    /// Concave anchor, when the agent is formation-eligible.
    pub anchor: Option<Point>,
    /// Final movement target.
    pub target: Point,
    /// Whether terrain repulsion was skipped because the oracle failed.
    pub terrain_skipped: bool,
}

/// Aggregator, potential field and formation controller bundled together.
#[derive(Debug, Clone)]
pub struct SteeringEngine {
    aggregator: SpatialForceAggregator,
    potential: PotentialField,
    formation: FormationController,
}

impl SteeringEngine {
    /// Build the engine from its three configuration sections.
    pub fn new(
        steering: SteeringConfig,
        potential: PotentialConfig,
        formation: FormationConfig,
    ) -> Self {
        let max_force = steering.max_force;
        Self {
            aggregator: SpatialForceAggregator::new(steering),
            potential: PotentialField::new(potential, max_force),
            formation: FormationController::new(formation),
        }
    }

    /// The flocking aggregator.
    pub const fn aggregator(&self) -> &SpatialForceAggregator {
        &self.aggregator
    }

    /// The repulsion field.
    pub const fn potential(&self) -> &PotentialField {
        &self.potential
    }

    /// The formation controller.
    pub const fn formation(&self) -> &FormationController {
        &self.formation
    }

    /// Compute the movement target for one agent.
    ///
    /// `target` is the agent's seek goal, typically the objective or the
    /// nearest enemy.
    ///
    /// # Errors
    ///
    /// Returns [`SteeringError::NonFinite`] if the agent's position or the
    /// combined force is not finite, and [`SteeringError::Untraversable`] if
    /// a ground agent's final target lies on blocked terrain.
    pub fn plan(
        &self,
        agent: &Agent,
        snapshot: &WorldSnapshot,
        terrain: &dyn TerrainOracle,
        chokepoints: &ChokepointCache,
        target: Option<Point>,
    ) -> Result<SteeringPlan, SteeringError> {
        let position = agent.position;
        if !position.is_finite() {
            return Err(SteeringError::NonFinite {
                tag: agent.tag,
                stage: "position",
            });
        }

        let steering = self.aggregator.config();
        let hood = snapshot.neighborhood(agent, steering.neighbor_radius);
        let units: Vec<&Enemy> = snapshot.hostile_units().collect();
        let structures: Vec<&Enemy> = snapshot.hostile_structures().collect();
        let enemy_centroid =
            snapshot.enemy_centroid_near(position, self.formation.config().engage_radius);
        let nearest_splash = snapshot
            .nearest_enemy(position, |e| e.class.is_splash_threat() && !e.is_structure())
            .map(|(_, d)| d);
        let splash_modifier = self.potential.splash_multiplier(nearest_splash);

        let forces = self.aggregator.compute(&ForceInput {
            agent,
            neighbors: &hood.members,
            target: target.filter(|t| t.is_finite()),
            enemies: &units,
            enemy_centroid,
            chokepoint_modifier: chokepoints.cohesion_modifier(position),
            splash_modifier,
        });

        let (obstacles, terrain_skipped) = self.obstacles(agent, snapshot, terrain);
        let repulsion = self.potential.compute(&PotentialInput {
            agent,
            enemy_units: &units,
            enemy_structures: &structures,
            obstacles: &obstacles,
            neighbors: &hood.members,
            nearest_splash,
        });

        let total = (forces.total + repulsion.total).clamp_length(steering.max_force);
        if !total.is_finite() {
            return Err(SteeringError::NonFinite {
                tag: agent.tag,
                stage: "force",
            });
        }

        let raw_target = position + self.aggregator.offset(total);
        let anchor = self.formation.concave_anchor(agent, enemy_centroid);
        let final_target = anchor.map_or(raw_target, |a| self.formation.blend(raw_target, a));

        if !agent.is_flying() && !terrain.is_traversable(final_target) {
            return Err(SteeringError::Untraversable {
                tag: agent.tag,
                target: final_target,
            });
        }

        Ok(SteeringPlan {
            forces,
            repulsion,
            total,
            raw_target,
            anchor,
            target: final_target,
            terrain_skipped,
        })
    }

    /// Fallback target: pure separation from nearby friendlies.
    ///
    /// # Errors
    ///
    /// Returns [`SteeringError::NonFinite`] if the agent's position is not
    /// finite.
    pub fn spacing_only(
        &self,
        agent: &Agent,
        snapshot: &WorldSnapshot,
    ) -> Result<Point, SteeringError> {
        if !agent.position.is_finite() {
            return Err(SteeringError::NonFinite {
                tag: agent.tag,
                stage: "position",
            });
        }
        let steering = self.aggregator.config();
        let hood = snapshot.neighborhood(agent, steering.neighbor_radius);
        let push = self.aggregator.separation(agent.position, &hood.members);
        Ok(agent.position + sanitize(self.aggregator.offset(push)))
    }

    /// Terrain obstacles and friendly structures near a ground agent.
    fn obstacles(
        &self,
        agent: &Agent,
        snapshot: &WorldSnapshot,
        terrain: &dyn TerrainOracle,
    ) -> (Vec<Point>, bool) {
        if agent.is_flying() {
            return (Vec::new(), false);
        }
        let radius = self.potential.config().terrain_radius;
        let (mut points, skipped) = match terrain.obstacles_near(agent.position, radius) {
            Ok(points) => (points, false),
            Err(_) => (Vec::new(), true),
        };
        points.extend(
            snapshot
                .friendly_structures()
                .iter()
                .copied()
                .filter(|p| p.distance(agent.position) < radius),
        );
        (points, skipped)
    }
}

impl Default for SteeringEngine {
    fn default() -> Self {
        Self::new(
            SteeringConfig::default(),
            PotentialConfig::default(),
            FormationConfig::default(),
        )
    }
}
