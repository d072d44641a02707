//! Spatial Force Aggregator: flocking forces for one agent.
//!
//! Six independent terms are computed from the agent's neighborhood, its
//! target, and nearby enemies:
//!
//! | Term | Direction | Magnitude |
//! |---|---|---|
//! | separation | away from neighbors inside `separation_radius`, weighted `1/d^2` | `max_force` |
//! | alignment | toward the neighbors' mean position | `max_force` |
//! | cohesion | toward the neighbors' mean position | `max_force` |
//! | seek | toward the target | `max_force * min(d / 10, 1)` |
//! | avoid | away from enemies inside `avoid_radius`, weighted `(R - d) / R` | at most `max_force` |
//! | encircle | tangent to the enemy centroid, side picked by tag parity | `max_force` |
//!
//! Every term is clamped to `max_force` on its own, combined with the
//! configured weights, and the sum is clamped again. The position data carries
//! no velocities, so alignment is positional rather than kinematic.
//!
//! None of this can fail. Zero neighbors, coincident points, or a missing
//! target produce a zero term.

use overmind_types::{Agent, Enemy, Point, Vec2};

use crate::config::SteeringConfig;

/// Distance at which the seek pull reaches full strength.
const SEEK_FULL_STRENGTH_DISTANCE: f64 = 10.0;

/// Everything the aggregator needs to know about one agent this tick.
#[derive(Debug, Clone)]
pub struct ForceInput<'a> {
    /// The agent being steered.
    pub agent: &'a Agent,
    /// Friendly agents within `neighbor_radius`, excluding the agent.
    pub neighbors: &'a [&'a Agent],
    /// Where the agent is trying to go, if anywhere.
    pub target: Option<Point>,
    /// Hostile units to consider for avoidance.
    pub enemies: &'a [&'a Enemy],
    /// Centroid of the engaged enemy group, if one exists.
    pub enemy_centroid: Option<Point>,
    /// Cohesion multiplier from the chokepoint cache (1.0 outside).
    pub chokepoint_modifier: f64,
    /// Separation and avoidance multiplier from splash escalation (1.0 calm).
    pub splash_modifier: f64,
}

/// Per-term forces and their clamped weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ForceBreakdown {
    /// Separation term, unweighted.
    pub separation: Vec2,
    /// Alignment term, unweighted.
    pub alignment: Vec2,
    /// Cohesion term, unweighted.
    pub cohesion: Vec2,
    /// Seek term, unweighted.
    pub seek: Vec2,
    /// Avoidance term, unweighted.
    pub avoid: Vec2,
    /// Encirclement term, unweighted.
    pub encircle: Vec2,
    /// Weighted sum clamped to `max_force`.
    pub total: Vec2,
}

/// Computes flocking forces from a [`SteeringConfig`].
#[derive(Debug, Clone, Default)]
pub struct SpatialForceAggregator {
    config: SteeringConfig,
}

impl SpatialForceAggregator {
    /// Create an aggregator with the given configuration.
    pub const fn new(config: SteeringConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &SteeringConfig {
        &self.config
    }

    /// Compute every term and the combined force.
    pub fn compute(&self, input: &ForceInput<'_>) -> ForceBreakdown {
        let cfg = &self.config;
        let position = input.agent.position;

        let separation = self.separation(position, input.neighbors);
        let alignment = self.alignment(position, input.neighbors);
        let cohesion = self.cohesion(position, input.neighbors);
        let seek = self.seek(position, input.target);
        let avoid = self.avoid(position, input.enemies);
        let encircle = self.encircle(input.agent, input.enemy_centroid);

        let choke = finite_or(input.chokepoint_modifier, 1.0);
        let splash = finite_or(input.splash_modifier, 1.0);

        let total = (separation * (cfg.separation_weight * splash)
            + alignment * cfg.alignment_weight
            + cohesion * (cfg.cohesion_weight * choke)
            + seek * cfg.seek_weight
            + avoid * (cfg.avoid_weight * splash)
            + encircle * cfg.encircle_weight)
            .clamp_length(cfg.max_force);

        ForceBreakdown {
            separation,
            alignment,
            cohesion,
            seek,
            avoid,
            encircle,
            total: sanitize(total),
        }
    }

    /// Push away from neighbors closer than `separation_radius`.
    ///
    /// A neighbor at distance zero is skipped: there is no direction to push.
    pub fn separation(&self, position: Point, neighbors: &[&Agent]) -> Vec2 {
        let radius = self.config.separation_radius;
        let mut sum = Vec2::ZERO;
        for neighbor in neighbors {
            let away = position - neighbor.position;
            let d_sq = away.length_squared();
            if !d_sq.is_finite() || d_sq <= 0.0 || d_sq >= radius * radius {
                continue;
            }
            sum += away.normalized() * (1.0 / d_sq);
        }
        self.full_strength(sum)
    }

    /// Head toward the neighbors' mean position.
    pub fn alignment(&self, position: Point, neighbors: &[&Agent]) -> Vec2 {
        let within = neighbors
            .iter()
            .filter(|n| n.position.distance(position) <= self.config.neighbor_radius)
            .map(|n| n.position);
        Point::centroid(within).map_or(Vec2::ZERO, |center| self.full_strength(center - position))
    }

    /// Pull toward the neighbors' mean position.
    ///
    /// The chokepoint modifier is applied by [`compute`](Self::compute).
    pub fn cohesion(&self, position: Point, neighbors: &[&Agent]) -> Vec2 {
        Point::centroid(neighbors.iter().map(|n| n.position))
            .map_or(Vec2::ZERO, |center| self.full_strength(center - position))
    }

    /// Pull toward the target, weakening inside the last ten units.
    pub fn seek(&self, position: Point, target: Option<Point>) -> Vec2 {
        let Some(target) = target else {
            return Vec2::ZERO;
        };
        let to = target - position;
        let scale = (to.length() / SEEK_FULL_STRENGTH_DISTANCE).min(1.0);
        sanitize(to.normalized() * (self.config.max_force * scale))
    }

    /// Push away from enemies inside `avoid_radius`, linearly stronger
    /// as they close in.
    pub fn avoid(&self, position: Point, enemies: &[&Enemy]) -> Vec2 {
        let radius = self.config.avoid_radius;
        if radius <= 0.0 {
            return Vec2::ZERO;
        }
        let mut sum = Vec2::ZERO;
        for enemy in enemies {
            let away = position - enemy.position;
            let d = away.length();
            if !d.is_finite() || d <= 0.0 || d >= radius {
                continue;
            }
            sum += away.normalized() * ((radius - d) / radius);
        }
        sanitize(sum.clamp_length(self.config.max_force))
    }

    /// Tangential flanking bias around the enemy centroid.
    ///
    /// Even tags circle counter-clockwise, odd tags clockwise, so a group
    /// wraps both sides of the target.
    pub fn encircle(&self, agent: &Agent, centroid: Option<Point>) -> Vec2 {
        let Some(centroid) = centroid else {
            return Vec2::ZERO;
        };
        let tangent = (centroid - agent.position).perpendicular();
        let side = if agent.tag.into_inner() % 2 == 0 {
            tangent
        } else {
            -tangent
        };
        self.full_strength(side)
    }

    /// Convert a combined force into a movement offset of at most
    /// `max_speed` map units.
    pub fn offset(&self, force: Vec2) -> Vec2 {
        let cfg = &self.config;
        if cfg.max_force <= 0.0 {
            return Vec2::ZERO;
        }
        sanitize(force.clamp_length(cfg.max_force) * (cfg.max_speed / cfg.max_force))
    }

    fn full_strength(&self, direction: Vec2) -> Vec2 {
        sanitize(direction.normalized() * self.config.max_force)
    }
}

/// Replace a non-finite vector with zero.
pub(crate) const fn sanitize(v: Vec2) -> Vec2 {
    if v.is_finite() { v } else { Vec2::ZERO }
}

const fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}
