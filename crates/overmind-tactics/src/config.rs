//! Tunable constants for the ability state machine bank.
//!
//! Deserialized as the `tactics` section of the engine's YAML configuration.
//! Health values are ratios in `0.0..=1.0`; distances are map units; tick
//! counts are simulation ticks; dwell times are simulated seconds.

use serde::{Deserialize, Serialize};

/// Ability bank configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticsConfig {
    // --- Land-mine ambush ---
    /// Minimum distance between any two mine reservations.
    #[serde(default = "default_mine_spacing")]
    pub mine_spacing: f64,

    /// Armed mines surface when an enemy ground unit is this close.
    #[serde(default = "default_unburrow_range")]
    pub unburrow_range: f64,

    /// Maximum number of simultaneous mine reservations.
    #[serde(default = "default_max_active_mines")]
    pub max_active_mines: usize,

    /// A deploying mine is on station within this distance of its slot.
    #[serde(default = "default_mine_arrival_radius")]
    pub mine_arrival_radius: f64,

    /// Chokepoints within this distance of an own base seed the mine search.
    #[serde(default = "default_mine_base_radius")]
    pub mine_base_radius: f64,

    /// Reservations not refreshed for this many ticks are evicted.
    #[serde(default = "default_reservation_timeout_ticks")]
    pub reservation_timeout_ticks: u64,

    // --- Explode ---
    /// Enemy ground units within this distance count for detonation.
    #[serde(default = "default_explode_range")]
    pub explode_range: f64,

    /// Surfaced banelings detonate with at least this many targets in range.
    #[serde(default = "default_min_targets_for_explode")]
    pub min_targets_for_explode: usize,

    /// Idle surfaced banelings burrow when an enemy ground unit is this close.
    #[serde(default = "default_ambush_range")]
    pub ambush_range: f64,

    // --- Regen dance ---
    /// Enter regeneration below this health ratio.
    #[serde(default = "default_regen_threshold")]
    pub regen_threshold: f64,

    /// Health ratio at which regeneration may end.
    #[serde(default = "default_regen_target")]
    pub regen_target: f64,

    /// Ticks after leaving regeneration before it may be entered again.
    #[serde(default = "default_regen_cooldown")]
    pub regen_cooldown: u64,

    /// Regeneration ends once this many seconds have passed, and never
    /// before.
    #[serde(default = "default_regen_min_dwell_seconds")]
    pub regen_min_dwell_seconds: f64,

    // --- Generic burrow ---
    /// Burrow below this health ratio when an enemy is near.
    #[serde(default = "default_burrow_health_threshold")]
    pub burrow_health_threshold: f64,

    /// Surface above this health ratio.
    #[serde(default = "default_unburrow_health_threshold")]
    pub unburrow_health_threshold: f64,

    /// "Enemy nearby" radius for the generic burrow rule.
    #[serde(default = "default_burrow_enemy_radius")]
    pub burrow_enemy_radius: f64,

    /// Burrowed lurkers surface when nothing is within range plus this margin.
    #[serde(default = "default_lurker_release_margin")]
    pub lurker_release_margin: f64,

    /// Minimum ticks between two burrow toggles of the same agent.
    #[serde(default = "default_burrow_toggle_cooldown_ticks")]
    pub burrow_toggle_cooldown_ticks: u64,

    // --- Area denial ---
    /// Lurkers and infestors below this health ratio escape to base.
    #[serde(default = "default_escape_health_threshold")]
    pub escape_health_threshold: f64,

    /// A denial or escape destination is reached within this distance.
    #[serde(default = "default_arrival_radius")]
    pub arrival_radius: f64,

    /// Fungal Growth cast range.
    #[serde(default = "default_fungal_range")]
    pub fungal_range: f64,

    /// Enemies within this radius of the aim point are caught by the cast.
    #[serde(default = "default_fungal_radius")]
    pub fungal_radius: f64,

    /// Minimum enemies caught before casting.
    #[serde(default = "default_fungal_min_targets")]
    pub fungal_min_targets: usize,

    /// Ticks between two Fungal Growth casts.
    #[serde(default = "default_fungal_cooldown_ticks")]
    pub fungal_cooldown_ticks: u64,

    // --- Research ---
    /// Whether Burrow is researched.
    #[serde(default = "default_true")]
    pub burrow_researched: bool,

    /// Whether burrowed movement is researched.
    #[serde(default = "default_true")]
    pub tunneling_claws: bool,
}

impl Default for TacticsConfig {
    fn default() -> Self {
        Self {
            mine_spacing: default_mine_spacing(),
            unburrow_range: default_unburrow_range(),
            max_active_mines: default_max_active_mines(),
            mine_arrival_radius: default_mine_arrival_radius(),
            mine_base_radius: default_mine_base_radius(),
            reservation_timeout_ticks: default_reservation_timeout_ticks(),
            explode_range: default_explode_range(),
            min_targets_for_explode: default_min_targets_for_explode(),
            ambush_range: default_ambush_range(),
            regen_threshold: default_regen_threshold(),
            regen_target: default_regen_target(),
            regen_cooldown: default_regen_cooldown(),
            regen_min_dwell_seconds: default_regen_min_dwell_seconds(),
            burrow_health_threshold: default_burrow_health_threshold(),
            unburrow_health_threshold: default_unburrow_health_threshold(),
            burrow_enemy_radius: default_burrow_enemy_radius(),
            lurker_release_margin: default_lurker_release_margin(),
            burrow_toggle_cooldown_ticks: default_burrow_toggle_cooldown_ticks(),
            escape_health_threshold: default_escape_health_threshold(),
            arrival_radius: default_arrival_radius(),
            fungal_range: default_fungal_range(),
            fungal_radius: default_fungal_radius(),
            fungal_min_targets: default_fungal_min_targets(),
            fungal_cooldown_ticks: default_fungal_cooldown_ticks(),
            burrow_researched: true,
            tunneling_claws: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_mine_spacing() -> f64 {
    6.0
}

const fn default_unburrow_range() -> f64 {
    3.5
}

const fn default_max_active_mines() -> usize {
    4
}

const fn default_mine_arrival_radius() -> f64 {
    1.0
}

const fn default_mine_base_radius() -> f64 {
    30.0
}

const fn default_reservation_timeout_ticks() -> u64 {
    224
}

const fn default_explode_range() -> f64 {
    2.2
}

const fn default_min_targets_for_explode() -> usize {
    3
}

const fn default_ambush_range() -> f64 {
    8.0
}

const fn default_regen_threshold() -> f64 {
    0.35
}

const fn default_regen_target() -> f64 {
    0.9
}

const fn default_regen_cooldown() -> u64 {
    112
}

const fn default_regen_min_dwell_seconds() -> f64 {
    3.0
}

const fn default_burrow_health_threshold() -> f64 {
    0.3
}

const fn default_unburrow_health_threshold() -> f64 {
    0.8
}

const fn default_burrow_enemy_radius() -> f64 {
    8.0
}

const fn default_lurker_release_margin() -> f64 {
    2.0
}

const fn default_burrow_toggle_cooldown_ticks() -> u64 {
    6
}

const fn default_escape_health_threshold() -> f64 {
    0.25
}

const fn default_arrival_radius() -> f64 {
    2.0
}

const fn default_fungal_range() -> f64 {
    10.0
}

const fn default_fungal_radius() -> f64 {
    2.25
}

const fn default_fungal_min_targets() -> usize {
    3
}

const fn default_fungal_cooldown_ticks() -> u64 {
    22
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_health_hysteresis() {
        let config = TacticsConfig::default();
        assert!(config.burrow_health_threshold < config.unburrow_health_threshold);
        assert!(config.regen_threshold < config.regen_target);
        assert!(config.unburrow_range < config.ambush_range);
    }

    #[test]
    fn yaml_overrides_single_fields() {
        let config: TacticsConfig =
            serde_yml::from_str("mine_spacing: 9.0\nburrow_researched: false\n").unwrap();
        assert!((config.mine_spacing - 9.0).abs() < f64::EPSILON);
        assert!(!config.burrow_researched);
        assert!(config.tunneling_claws);
        assert_eq!(config.max_active_mines, 4);
    }
}
