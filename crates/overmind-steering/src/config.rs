//! Tunable constants for the steering layer.
//!
//! Each struct is one section of the engine's YAML configuration
//! (`steering`, `potential`, `formation`). Every field has a default, so an
//! empty or partial section deserializes to a working configuration.

use serde::{Deserialize, Serialize};

/// Spatial Force Aggregator weights and radii.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteeringConfig {
    /// Weight of the separation term.
    #[serde(default = "default_separation_weight")]
    pub separation_weight: f64,

    /// Weight of the positional alignment term.
    #[serde(default = "default_alignment_weight")]
    pub alignment_weight: f64,

    /// Weight of the cohesion term (before the chokepoint modifier).
    #[serde(default = "default_cohesion_weight")]
    pub cohesion_weight: f64,

    /// Weight of the target-seeking term.
    #[serde(default = "default_seek_weight")]
    pub seek_weight: f64,

    /// Weight of the enemy-avoidance term (before the splash modifier).
    #[serde(default = "default_avoid_weight")]
    pub avoid_weight: f64,

    /// Weight of the encirclement term.
    #[serde(default = "default_encircle_weight")]
    pub encircle_weight: f64,

    /// Neighbors closer than this push the agent away.
    #[serde(default = "default_separation_radius")]
    pub separation_radius: f64,

    /// Radius of the friendly neighborhood.
    #[serde(default = "default_neighbor_radius")]
    pub neighbor_radius: f64,

    /// Enemies within this radius contribute to avoidance.
    #[serde(default = "default_avoid_radius")]
    pub avoid_radius: f64,

    /// Maximum magnitude of any single force and of the combined force.
    #[serde(default = "default_max_force")]
    pub max_force: f64,

    /// Movement offset, in map units, produced by a force of `max_force`.
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            separation_weight: default_separation_weight(),
            alignment_weight: default_alignment_weight(),
            cohesion_weight: default_cohesion_weight(),
            seek_weight: default_seek_weight(),
            avoid_weight: default_avoid_weight(),
            encircle_weight: default_encircle_weight(),
            separation_radius: default_separation_radius(),
            neighbor_radius: default_neighbor_radius(),
            avoid_radius: default_avoid_radius(),
            max_force: default_max_force(),
            max_speed: default_max_speed(),
        }
    }
}

/// Potential Field Repulsion weights and radii.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialConfig {
    /// Weight of enemy-unit repulsion.
    #[serde(default = "default_enemy_weight")]
    pub enemy_weight: f64,

    /// Weight of hostile-structure repulsion. Larger than `enemy_weight`.
    #[serde(default = "default_structure_weight")]
    pub structure_weight: f64,

    /// Weight of terrain and friendly-structure repulsion (ground only).
    #[serde(default = "default_terrain_weight")]
    pub terrain_weight: f64,

    /// Enemy units within this radius repel.
    #[serde(default = "default_enemy_radius")]
    pub enemy_radius: f64,

    /// Hostile structures within this radius repel.
    #[serde(default = "default_structure_radius")]
    pub structure_radius: f64,

    /// Terrain obstacles within this radius repel ground agents.
    #[serde(default = "default_terrain_radius")]
    pub terrain_radius: f64,

    /// Distance at which splash escalation starts.
    #[serde(default = "default_splash_avoid_radius")]
    pub splash_avoid_radius: f64,

    /// Separation multiplier at or beyond `splash_avoid_radius`.
    #[serde(default = "default_splash_separation_min")]
    pub splash_separation_min: f64,

    /// Separation multiplier with a splash threat on top of the agent.
    #[serde(default = "default_splash_separation_max")]
    pub splash_separation_max: f64,

    /// Weight of the extra neighbor spread for splash-sensitive flyers.
    #[serde(default = "default_splash_repulsion_air")]
    pub splash_repulsion_air: f64,

    /// Neighbor radius for the splash-sensitive flyer spread.
    #[serde(default = "default_splash_spread_radius")]
    pub splash_spread_radius: f64,
}

impl Default for PotentialConfig {
    fn default() -> Self {
        Self {
            enemy_weight: default_enemy_weight(),
            structure_weight: default_structure_weight(),
            terrain_weight: default_terrain_weight(),
            enemy_radius: default_enemy_radius(),
            structure_radius: default_structure_radius(),
            terrain_radius: default_terrain_radius(),
            splash_avoid_radius: default_splash_avoid_radius(),
            splash_separation_min: default_splash_separation_min(),
            splash_separation_max: default_splash_separation_max(),
            splash_repulsion_air: default_splash_repulsion_air(),
            splash_spread_radius: default_splash_spread_radius(),
        }
    }
}

/// Formation Controller and chokepoint cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationConfig {
    /// Blend weight of the concave anchor against the raw force target.
    #[serde(default = "default_concave_weight")]
    pub concave_weight: f64,

    /// Angular step, in radians, between fan slots.
    #[serde(default = "default_spread_angle")]
    pub spread_angle: f64,

    /// Extra distance added to weapon range for the arc radius.
    #[serde(default = "default_range_buffer")]
    pub range_buffer: f64,

    /// Enemies within this radius of an agent form its target centroid.
    #[serde(default = "default_engage_radius")]
    pub engage_radius: f64,

    /// Points within this radius of a chokepoint are inside it.
    #[serde(default = "default_chokepoint_radius")]
    pub chokepoint_radius: f64,

    /// Cohesion multiplier inside a chokepoint.
    #[serde(default = "default_chokepoint_cohesion")]
    pub chokepoint_cohesion: f64,

    /// Per-tick multiplicative decay of recorded chokepoint threat.
    #[serde(default = "default_threat_decay")]
    pub threat_decay: f64,

    /// Enemies within this radius of a chokepoint add to its threat.
    #[serde(default = "default_threat_radius")]
    pub threat_radius: f64,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            concave_weight: default_concave_weight(),
            spread_angle: default_spread_angle(),
            range_buffer: default_range_buffer(),
            engage_radius: default_engage_radius(),
            chokepoint_radius: default_chokepoint_radius(),
            chokepoint_cohesion: default_chokepoint_cohesion(),
            threat_decay: default_threat_decay(),
            threat_radius: default_threat_radius(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_separation_weight() -> f64 {
    1.5
}

const fn default_alignment_weight() -> f64 {
    0.3
}

const fn default_cohesion_weight() -> f64 {
    0.5
}

const fn default_seek_weight() -> f64 {
    1.0
}

const fn default_avoid_weight() -> f64 {
    1.2
}

const fn default_encircle_weight() -> f64 {
    0.4
}

const fn default_separation_radius() -> f64 {
    2.0
}

const fn default_neighbor_radius() -> f64 {
    6.0
}

const fn default_avoid_radius() -> f64 {
    8.0
}

const fn default_max_force() -> f64 {
    1.0
}

const fn default_max_speed() -> f64 {
    3.0
}

const fn default_enemy_weight() -> f64 {
    1.0
}

const fn default_structure_weight() -> f64 {
    1.8
}

const fn default_terrain_weight() -> f64 {
    0.8
}

const fn default_enemy_radius() -> f64 {
    6.0
}

const fn default_structure_radius() -> f64 {
    8.0
}

const fn default_terrain_radius() -> f64 {
    2.0
}

const fn default_splash_avoid_radius() -> f64 {
    10.0
}

const fn default_splash_separation_min() -> f64 {
    1.0
}

const fn default_splash_separation_max() -> f64 {
    3.0
}

const fn default_splash_repulsion_air() -> f64 {
    2.0
}

const fn default_splash_spread_radius() -> f64 {
    4.0
}

const fn default_concave_weight() -> f64 {
    0.6
}

const fn default_spread_angle() -> f64 {
    0.2
}

const fn default_range_buffer() -> f64 {
    1.0
}

const fn default_engage_radius() -> f64 {
    15.0
}

const fn default_chokepoint_radius() -> f64 {
    5.0
}

const fn default_chokepoint_cohesion() -> f64 {
    0.25
}

const fn default_threat_decay() -> f64 {
    0.95
}

const fn default_threat_radius() -> f64 {
    10.0
}
