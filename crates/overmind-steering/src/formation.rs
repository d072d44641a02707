//! Formation Controller: concave fan anchors and the chokepoint cache.
//!
//! Ranged ground agents fan out on an arc facing the enemy centroid so more
//! of them can fire at once. Each agent's slot on the arc is derived from its
//! tag, so the same agent keeps the same slot tick after tick without any
//! stored state.
//!
//! The [`ChokepointCache`] holds the terrain oracle's chokepoints between
//! refreshes and answers "is this position inside a chokepoint" for the
//! cohesion modifier. It also keeps a decaying threat level per chokepoint
//! from observed enemy presence.

use overmind_types::{Agent, Chokepoint, Domain, Point, Vec2};
use overmind_world::{TerrainOracle, WorldError};
use tracing::debug;

use crate::config::FormationConfig;

/// Minimum arc radius, regardless of weapon range.
pub const MIN_ARC_RADIUS: f64 = 4.0;

/// Number of fan slots; tags map onto `(tag % 7) - 3`.
const FAN_SLOTS: u64 = 7;

/// Computes concave anchors from a [`FormationConfig`].
#[derive(Debug, Clone, Default)]
pub struct FormationController {
    config: FormationConfig,
}

impl FormationController {
    /// Create a controller with the given configuration.
    pub const fn new(config: FormationConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &FormationConfig {
        &self.config
    }

    /// Whether `agent` takes part in concave formations.
    pub fn is_eligible(agent: &Agent) -> bool {
        agent.domain == Domain::Ground && agent.class.is_ranged()
    }

    /// Arc radius for an agent: weapon range plus buffer, at least
    /// [`MIN_ARC_RADIUS`].
    pub fn arc_radius(&self, agent: &Agent) -> f64 {
        (agent.class.attack_range() + self.config.range_buffer).max(MIN_ARC_RADIUS)
    }

    /// Signed slot index in `-3..=3` derived from the agent's tag.
    pub fn fan_slot(agent: &Agent) -> i32 {
        let slot = agent.tag.into_inner() % FAN_SLOTS;
        i32::try_from(slot).unwrap_or(0) - 3
    }

    /// The agent's concave anchor around `centroid`.
    ///
    /// Returns `None` for flying or melee agents and when there is no
    /// centroid. An agent sitting exactly on the centroid is treated as
    /// approaching from the east.
    pub fn concave_anchor(&self, agent: &Agent, centroid: Option<Point>) -> Option<Point> {
        if !Self::is_eligible(agent) {
            return None;
        }
        let centroid = centroid.filter(|c| c.is_finite())?;
        let from_centroid = agent.position - centroid;
        let bearing = if from_centroid.is_zero() {
            0.0
        } else {
            from_centroid.angle()
        };
        let angle = bearing + f64::from(Self::fan_slot(agent)) * self.config.spread_angle;
        let anchor = centroid + Vec2::from_angle(angle) * self.arc_radius(agent);
        anchor.is_finite().then_some(anchor)
    }

    /// Blend the raw force target toward the anchor by `concave_weight`.
    pub fn blend(&self, raw: Point, anchor: Point) -> Point {
        raw.lerp(anchor, self.config.concave_weight.clamp(0.0, 1.0))
    }
}

// ---------------------------------------------------------------------------
// Chokepoint cache
// ---------------------------------------------------------------------------

/// Cached chokepoints with cohesion and threat queries.
#[derive(Debug, Clone)]
pub struct ChokepointCache {
    chokepoints: Vec<Chokepoint>,
    last_refresh: Option<u64>,
    radius: f64,
    dampened_cohesion: f64,
    threat_decay: f64,
    threat_radius: f64,
}

impl ChokepointCache {
    /// Create an empty cache using the chokepoint settings in `config`.
    pub fn new(config: &FormationConfig) -> Self {
        Self {
            chokepoints: Vec::new(),
            last_refresh: None,
            radius: config.chokepoint_radius,
            dampened_cohesion: config.chokepoint_cohesion,
            threat_decay: config.threat_decay.clamp(0.0, 1.0),
            threat_radius: config.threat_radius,
        }
    }

    /// Whether a refresh is due at `tick` for the given interval.
    ///
    /// An empty cache that has never been refreshed is always due.
    pub fn is_refresh_due(&self, tick: u64, interval: u64) -> bool {
        self.last_refresh
            .is_none_or(|last| tick.saturating_sub(last) >= interval.max(1))
    }

    /// Reload chokepoints from the oracle.
    ///
    /// Threat levels carry over for chokepoints whose position is unchanged.
    /// On failure the previous chokepoints are kept and the refresh will be
    /// retried on the next call.
    ///
    /// # Errors
    ///
    /// Propagates the oracle's [`WorldError`].
    pub fn refresh(&mut self, tick: u64, terrain: &dyn TerrainOracle) -> Result<usize, WorldError> {
        let points = terrain.nearest_chokepoints()?;
        let chokepoints: Vec<Chokepoint> = points
            .into_iter()
            .filter(|p| p.is_finite())
            .map(|position| {
                let threat_level = self
                    .chokepoints
                    .iter()
                    .find(|old| old.position.distance(position) < f64::EPSILON)
                    .map_or(0.0, |old| old.threat_level);
                Chokepoint {
                    position,
                    threat_level,
                }
            })
            .collect();
        let count = chokepoints.len();
        self.chokepoints = chokepoints;
        self.last_refresh = Some(tick);
        debug!(tick, count, "chokepoint cache refreshed");
        Ok(count)
    }

    /// All cached chokepoints.
    pub fn chokepoints(&self) -> &[Chokepoint] {
        &self.chokepoints
    }

    /// Tick of the last successful refresh.
    pub const fn last_refresh(&self) -> Option<u64> {
        self.last_refresh
    }

    /// Whether `point` lies within `chokepoint_radius` of a chokepoint.
    pub fn is_in_chokepoint(&self, point: Point) -> bool {
        self.chokepoints
            .iter()
            .any(|c| c.position.distance(point) <= self.radius)
    }

    /// Cohesion multiplier at `point`: the dampened value inside a
    /// chokepoint, exactly 1.0 elsewhere.
    pub fn cohesion_modifier(&self, point: Point) -> f64 {
        if self.is_in_chokepoint(point) {
            self.dampened_cohesion
        } else {
            1.0
        }
    }

    /// Decay every threat level once, then add one unit of threat per enemy
    /// within `threat_radius` of each chokepoint.
    pub fn record_threat(&mut self, enemy_positions: &[Point]) {
        for choke in &mut self.chokepoints {
            let nearby = enemy_positions
                .iter()
                .filter(|p| p.distance(choke.position) <= self.threat_radius)
                .count();
            let added = f64::from(u32::try_from(nearby).unwrap_or(u32::MAX));
            choke.threat_level = choke.threat_level.mul_add(self.threat_decay, added);
        }
    }

    /// The chokepoint with the highest recorded threat, if any has threat.
    pub fn highest_threat(&self) -> Option<&Chokepoint> {
        self.chokepoints
            .iter()
            .filter(|c| c.threat_level > 0.0)
            .max_by(|a, b| a.threat_level.total_cmp(&b.threat_level))
    }

    /// Chokepoints within `radius` of `point`, nearest first.
    pub fn near(&self, point: Point, radius: f64) -> Vec<&Chokepoint> {
        let mut found: Vec<&Chokepoint> = self
            .chokepoints
            .iter()
            .filter(|c| c.position.distance(point) <= radius)
            .collect();
        found.sort_by(|a, b| {
            a.position
                .distance(point)
                .total_cmp(&b.position.distance(point))
        });
        found
    }
}
