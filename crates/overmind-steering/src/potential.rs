//! Potential Field Repulsion: structure, terrain, and splash-aware danger.
//!
//! This term is additive with the aggregator's enemy avoidance. It keeps
//! unit danger (enemy units) apart from static danger (hostile structures,
//! which repel harder and from further out) and from terrain. Terrain and
//! friendly structure footprints only repel ground agents; flyers ignore
//! them.
//!
//! Splash escalation: when a splash-class enemy is visible, the separation
//! multiplier ramps linearly from `splash_separation_min` at
//! `splash_avoid_radius` up to `splash_separation_max` at distance zero.
//! Splash-sensitive flyers additionally spread from their neighbors.

use overmind_types::{Agent, Enemy, Point, Vec2};

use crate::boids::sanitize;
use crate::config::PotentialConfig;

/// Inputs to the repulsion field for one agent.
#[derive(Debug, Clone)]
pub struct PotentialInput<'a> {
    /// The agent being steered.
    pub agent: &'a Agent,
    /// Hostile mobile units.
    pub enemy_units: &'a [&'a Enemy],
    /// Hostile structures.
    pub enemy_structures: &'a [&'a Enemy],
    /// Terrain obstacle points and friendly structure footprints near the agent.
    pub obstacles: &'a [Point],
    /// Friendly neighbors, used for the splash-sensitive flyer spread.
    pub neighbors: &'a [&'a Agent],
    /// Distance to the nearest visible splash threat, if any.
    pub nearest_splash: Option<f64>,
}

/// Per-source repulsion and the clamped sum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PotentialBreakdown {
    /// Enemy-unit repulsion, weighted.
    pub enemy: Vec2,
    /// Hostile-structure repulsion, weighted.
    pub structure: Vec2,
    /// Terrain and friendly-structure repulsion, weighted (ground only).
    pub terrain: Vec2,
    /// Extra neighbor spread for splash-sensitive flyers.
    pub splash_air: Vec2,
    /// Splash separation multiplier for this agent.
    pub splash_multiplier: f64,
    /// Sum of all terms clamped to `max_force`.
    pub total: Vec2,
}

/// Computes repulsion from a [`PotentialConfig`].
#[derive(Debug, Clone)]
pub struct PotentialField {
    config: PotentialConfig,
    max_force: f64,
}

impl PotentialField {
    /// Create a field. `max_force` bounds each term and the sum.
    pub const fn new(config: PotentialConfig, max_force: f64) -> Self {
        Self { config, max_force }
    }

    /// The active configuration.
    pub const fn config(&self) -> &PotentialConfig {
        &self.config
    }

    /// Compute every repulsion term for one agent.
    pub fn compute(&self, input: &PotentialInput<'_>) -> PotentialBreakdown {
        let cfg = &self.config;
        let position = input.agent.position;

        let enemy_positions = input.enemy_units.iter().map(|e| e.position);
        let enemy = self.weighted(
            radial_repulsion(position, enemy_positions, cfg.enemy_radius),
            cfg.enemy_weight,
        );
        let structure = self.weighted(
            radial_repulsion(
                position,
                input.enemy_structures.iter().map(|e| e.position),
                cfg.structure_radius,
            ),
            cfg.structure_weight,
        );
        let terrain = if input.agent.is_flying() {
            Vec2::ZERO
        } else {
            self.weighted(
                radial_repulsion(position, input.obstacles.iter().copied(), cfg.terrain_radius),
                cfg.terrain_weight,
            )
        };

        let splash_multiplier = self.splash_multiplier(input.nearest_splash);
        let splash_air = if input.agent.is_flying()
            && input.agent.class.is_splash_sensitive_air()
            && input.nearest_splash.is_some()
        {
            self.air_spread(position, input.neighbors, splash_multiplier)
        } else {
            Vec2::ZERO
        };

        let sum = enemy + structure + terrain + splash_air;
        let total = sanitize(sum.clamp_length(self.max_force));
        PotentialBreakdown {
            enemy,
            structure,
            terrain,
            splash_air,
            splash_multiplier,
            total,
        }
    }

    /// Separation multiplier for a given distance to the nearest splash
    /// threat.
    ///
    /// With no threat, or a threat at or beyond `splash_avoid_radius`, this is
    /// `splash_separation_min`. It rises linearly to `splash_separation_max`
    /// as the distance falls to zero.
    pub fn splash_multiplier(&self, nearest: Option<f64>) -> f64 {
        let cfg = &self.config;
        let Some(distance) = nearest.filter(|d| d.is_finite()) else {
            return cfg.splash_separation_min;
        };
        if cfg.splash_avoid_radius <= 0.0 || distance >= cfg.splash_avoid_radius {
            return cfg.splash_separation_min;
        }
        let closeness = 1.0 - distance.max(0.0) / cfg.splash_avoid_radius;
        let span = cfg.splash_separation_max - cfg.splash_separation_min;
        span.mul_add(closeness, cfg.splash_separation_min)
    }

    /// Neighbor-only spread for splash-sensitive flyers. Enemies are ignored.
    fn air_spread(&self, position: Point, neighbors: &[&Agent], multiplier: f64) -> Vec2 {
        let radius = self.config.splash_spread_radius;
        let mut sum = Vec2::ZERO;
        for neighbor in neighbors {
            let away = position - neighbor.position;
            let d_sq = away.length_squared();
            if !d_sq.is_finite() || d_sq <= 0.0 || d_sq >= radius * radius {
                continue;
            }
            sum += away.normalized() * (1.0 / d_sq);
        }
        let strength = self.config.splash_repulsion_air * multiplier * self.max_force;
        let scaled = sum.normalized() * strength;
        sanitize(scaled.clamp_length(self.max_force))
    }

    fn weighted(&self, unit_force: Vec2, weight: f64) -> Vec2 {
        sanitize((unit_force * (weight * self.max_force)).clamp_length(self.max_force))
    }
}

/// Sum of unit vectors away from each source inside `radius`, each weighted
/// by `(radius - d) / radius`, clamped to unit length.
fn radial_repulsion(position: Point, sources: impl Iterator<Item = Point>, radius: f64) -> Vec2 {
    if radius <= 0.0 {
        return Vec2::ZERO;
    }
    let mut sum = Vec2::ZERO;
    for source in sources {
        let away = position - source;
        let d = away.length();
        if !d.is_finite() || d <= 0.0 || d >= radius {
            continue;
        }
        sum += away.normalized() * ((radius - d) / radius);
    }
    sanitize(sum.clamp_length(1.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use overmind_types::{UnitClass, UnitTag};

    use super::*;

    fn field() -> PotentialField {
        PotentialField::new(PotentialConfig::default(), 1.0)
    }

    fn unit(tag: u64, class: UnitClass, x: f64, y: f64) -> Agent {
        Agent::new(UnitTag::new(tag), class, Point::new(x, y))
    }

    fn foe(tag: u64, class: UnitClass, x: f64, y: f64) -> Enemy {
        Enemy::new(UnitTag::new(tag), class, Point::new(x, y))
    }

    fn calm<'a>(agent: &'a Agent) -> PotentialInput<'a> {
        PotentialInput {
            agent,
            enemy_units: &[],
            enemy_structures: &[],
            obstacles: &[],
            neighbors: &[],
            nearest_splash: None,
        }
    }

    #[test]
    fn structures_repel_harder_than_units_at_equal_distance() {
        let f = field();
        let me = unit(1, UnitClass::Roach, 0.0, 0.0);
        let marine = foe(10, UnitClass::Marine, 3.0, 0.0);
        let bunker = foe(11, UnitClass::Bunker, 3.0, 0.0);

        let units = [&marine];
        let mut from_unit = calm(&me);
        from_unit.enemy_units = &units;
        let structures = [&bunker];
        let mut from_structure = calm(&me);
        from_structure.enemy_structures = &structures;

        let u = f.compute(&from_unit).total;
        let s = f.compute(&from_structure).total;
        assert!(u.x < 0.0 && s.x < 0.0);
        assert!(s.length() > u.length());
    }

    #[test]
    fn flyers_ignore_terrain() {
        let f = field();
        let obstacles = [Point::new(1.0, 0.0)];
        let ground = unit(1, UnitClass::Zergling, 0.0, 0.0);
        let air = unit(2, UnitClass::Mutalisk, 0.0, 0.0);

        let mut g = calm(&ground);
        g.obstacles = &obstacles;
        let mut a = calm(&air);
        a.obstacles = &obstacles;

        assert!(f.compute(&g).terrain.x < 0.0);
        assert!(f.compute(&a).terrain.is_zero());
    }

    #[test]
    fn splash_multiplier_ramps_monotonically_from_boundary() {
        let f = field();
        let cfg = f.config().clone();
        assert!((f.splash_multiplier(None) - cfg.splash_separation_min).abs() < 1e-12);
        assert!((f.splash_multiplier(Some(10.0)) - cfg.splash_separation_min).abs() < 1e-12);

        let mut previous = f.splash_multiplier(Some(10.0));
        for step in 1..=12 {
            let distance = 10.0 - 0.5 * f64::from(step);
            let current = f.splash_multiplier(Some(distance));
            assert!(current > previous, "distance {distance}");
            previous = current;
        }
        assert!((f.splash_multiplier(Some(0.0)) - cfg.splash_separation_max).abs() < 1e-12);
    }

    #[test]
    fn splash_sensitive_flyers_spread_from_neighbors() {
        let f = field();
        let muta = unit(1, UnitClass::Mutalisk, 0.0, 0.0);
        let buddy = unit(2, UnitClass::Mutalisk, 1.0, 0.0);
        let neighbors = [&buddy];

        let mut threatened = calm(&muta);
        threatened.neighbors = &neighbors;
        threatened.nearest_splash = Some(4.0);
        let out = f.compute(&threatened);
        assert!(out.splash_air.x < 0.0);
        assert!(out.splash_multiplier > f.config().splash_separation_min);

        let mut quiet = calm(&muta);
        quiet.neighbors = &neighbors;
        assert!(f.compute(&quiet).splash_air.is_zero());

        let corruptor = unit(3, UnitClass::Corruptor, 0.0, 0.0);
        let mut other_flyer = calm(&corruptor);
        other_flyer.neighbors = &neighbors;
        other_flyer.nearest_splash = Some(4.0);
        assert!(f.compute(&other_flyer).splash_air.is_zero());
    }
}
