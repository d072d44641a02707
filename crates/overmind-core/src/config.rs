//! Configuration loading and typed config structures for the Overmind engine.
//!
//! The canonical configuration lives in `overmind-config.yaml` at the project
//! root. Every section is optional; missing sections and fields fall back to
//! the tuned defaults. The steering, potential, formation and tactics sections
//! are owned by the crates that consume them and are re-used here verbatim.

use std::path::Path;

use overmind_steering::{FormationConfig, PotentialConfig, SteeringConfig};
use overmind_tactics::TacticsConfig;
use serde::{Deserialize, Serialize};

/// Environment variable overriding `logging.level`.
pub const LOG_LEVEL_ENV: &str = "OVERMIND_LOG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The values parsed but are not usable together.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `overmind-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MicroConfig {
    /// Flocking weights and radii.
    #[serde(default)]
    pub steering: SteeringConfig,

    /// Repulsion and splash escalation.
    #[serde(default)]
    pub potential: PotentialConfig,

    /// Concave formation and chokepoint cache.
    #[serde(default)]
    pub formation: FormationConfig,

    /// Ability state machine thresholds.
    #[serde(default)]
    pub tactics: TacticsConfig,

    /// Cadences and run-loop timing.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MicroConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `OVERMIND_LOG` overrides `logging.level`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.steering;
        for (name, weight) in [
            ("steering.separation_weight", s.separation_weight),
            ("steering.alignment_weight", s.alignment_weight),
            ("steering.cohesion_weight", s.cohesion_weight),
            ("steering.seek_weight", s.seek_weight),
            ("steering.avoid_weight", s.avoid_weight),
            ("steering.encircle_weight", s.encircle_weight),
            ("potential.enemy_weight", self.potential.enemy_weight),
            ("potential.structure_weight", self.potential.structure_weight),
            ("potential.terrain_weight", self.potential.terrain_weight),
            ("potential.splash_repulsion_air", self.potential.splash_repulsion_air),
        ] {
            non_negative(name, weight)?;
        }

        let p = &self.potential;
        let f = &self.formation;
        let t = &self.tactics;
        for (name, radius) in [
            ("steering.separation_radius", s.separation_radius),
            ("steering.neighbor_radius", s.neighbor_radius),
            ("steering.avoid_radius", s.avoid_radius),
            ("steering.max_force", s.max_force),
            ("steering.max_speed", s.max_speed),
            ("potential.enemy_radius", p.enemy_radius),
            ("potential.structure_radius", p.structure_radius),
            ("potential.terrain_radius", p.terrain_radius),
            ("potential.splash_avoid_radius", p.splash_avoid_radius),
            ("potential.splash_spread_radius", p.splash_spread_radius),
            ("formation.engage_radius", f.engage_radius),
            ("formation.chokepoint_radius", f.chokepoint_radius),
            ("formation.threat_radius", f.threat_radius),
            ("tactics.mine_spacing", t.mine_spacing),
            ("tactics.unburrow_range", t.unburrow_range),
            ("tactics.mine_arrival_radius", t.mine_arrival_radius),
            ("tactics.explode_range", t.explode_range),
            ("tactics.ambush_range", t.ambush_range),
            ("tactics.burrow_enemy_radius", t.burrow_enemy_radius),
            ("tactics.arrival_radius", t.arrival_radius),
            ("tactics.fungal_range", t.fungal_range),
            ("tactics.fungal_radius", t.fungal_radius),
            ("schedule.ticks_per_second", self.schedule.ticks_per_second),
        ] {
            positive(name, radius)?;
        }

        if !(0.0..=1.0).contains(&f.concave_weight) {
            return invalid("formation.concave_weight must lie in 0..=1");
        }
        if !(0.0..=1.0).contains(&f.threat_decay) {
            return invalid("formation.threat_decay must lie in 0..=1");
        }
        if p.splash_separation_min > p.splash_separation_max {
            return invalid("potential.splash_separation_min exceeds splash_separation_max");
        }
        if t.burrow_health_threshold >= t.unburrow_health_threshold {
            return invalid(
                "tactics.burrow_health_threshold must be below unburrow_health_threshold",
            );
        }
        if t.regen_threshold >= t.regen_target {
            return invalid("tactics.regen_threshold must be below regen_target");
        }
        if !t.regen_min_dwell_seconds.is_finite() || t.regen_min_dwell_seconds < 0.0 {
            return invalid("tactics.regen_min_dwell_seconds must be finite and non-negative");
        }
        if t.max_active_mines == 0 {
            return invalid("tactics.max_active_mines must be at least 1");
        }

        let sched = &self.schedule;
        for (name, interval) in [
            ("schedule.update_interval", sched.update_interval),
            ("schedule.burrow_check_interval", sched.burrow_check_interval),
            ("schedule.chokepoint_refresh_interval", sched.chokepoint_refresh_interval),
        ] {
            if interval == 0 {
                return Err(ConfigError::Invalid {
                    reason: format!("{name} must be at least 1"),
                });
            }
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            reason: format!("{name} must be positive, got {value}"),
        })
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            reason: format!("{name} must be non-negative, got {value}"),
        })
    }
}

fn invalid(reason: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid {
        reason: reason.to_owned(),
    })
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Cadences and run-loop timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Simulation ticks per real second.
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: f64,

    /// Movement stage runs every N ticks.
    #[serde(default = "default_update_interval")]
    pub update_interval: u64,

    /// Ability bank runs every N ticks.
    #[serde(default = "default_burrow_check_interval")]
    pub burrow_check_interval: u64,

    /// Chokepoint cache refresh interval in ticks.
    #[serde(default = "default_chokepoint_refresh_interval")]
    pub chokepoint_refresh_interval: u64,

    /// Real-time milliseconds between ticks in the run loop (0 = no sleep).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: default_ticks_per_second(),
            update_interval: default_update_interval(),
            burrow_check_interval: default_burrow_check_interval(),
            chokepoint_refresh_interval: default_chokepoint_refresh_interval(),
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,

    /// Per-agent failures log at most once per `(tag, kind)` in this window.
    #[serde(default = "default_throttle_window_ticks")]
    pub throttle_window_ticks: u64,
}

impl LoggingConfig {
    /// Apply the `OVERMIND_LOG` override, if set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV)
            && !level.trim().is_empty()
        {
            self.level = level;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            throttle_window_ticks: default_throttle_window_ticks(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_ticks_per_second() -> f64 {
    22.4
}

const fn default_update_interval() -> u64 {
    2
}

const fn default_burrow_check_interval() -> u64 {
    8
}

const fn default_chokepoint_refresh_interval() -> u64 {
    100
}

const fn default_tick_interval_ms() -> u64 {
    45
}

fn default_log_level() -> String {
    String::from("info")
}

const fn default_throttle_window_ticks() -> u64 {
    224
}
