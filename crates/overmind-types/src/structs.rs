//! Core entity structs observed once per tick.
//!
//! [`Agent`] and [`Enemy`] are plain snapshots. Nothing in the engine
//! mutates a position; components only propose commands.

use serde::{Deserialize, Serialize};

use crate::enums::{Domain, UnitClass};
use crate::geometry::Point;
use crate::ids::UnitTag;

/// A controllable friendly unit as observed this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Stable engine tag.
    pub tag: UnitTag,
    /// Current map position.
    pub position: Point,
    /// Unit class.
    pub class: UnitClass,
    /// Movement domain.
    pub domain: Domain,
    /// Current health as a fraction of maximum (0.0 to 1.0).
    pub health_ratio: f64,
    /// Seconds until the weapon can fire again (0 when ready).
    pub weapon_cooldown: f64,
    /// Current energy for casters (0 for units without energy).
    pub energy: f64,
    /// Whether the unit is burrowed.
    pub is_burrowed: bool,
    /// Whether the unit has no active order.
    pub is_idle: bool,
}

impl Agent {
    /// Build a healthy, idle, surfaced agent of `class` at `position`.
    ///
    /// The domain is taken from the class default.
    pub const fn new(tag: UnitTag, class: UnitClass, position: Point) -> Self {
        Self {
            tag,
            position,
            class,
            domain: class.default_domain(),
            health_ratio: 1.0,
            weapon_cooldown: 0.0,
            energy: 0.0,
            is_burrowed: false,
            is_idle: true,
        }
    }

    /// Whether the weapon is ready to fire.
    pub const fn weapon_ready(&self) -> bool {
        self.weapon_cooldown <= 0.0
    }

    /// Whether the agent flies.
    pub fn is_flying(&self) -> bool {
        self.domain == Domain::Flying
    }
}

/// A visible hostile unit or structure. Read-only; never commanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    /// Stable engine tag.
    pub tag: UnitTag,
    /// Current map position.
    pub position: Point,
    /// Unit class.
    pub class: UnitClass,
    /// Movement domain.
    pub domain: Domain,
    /// Current health as a fraction of maximum (0.0 to 1.0).
    pub health_ratio: f64,
    /// Seconds until the weapon can fire again (0 when ready).
    pub weapon_cooldown: f64,
    /// Whether the unit is burrowed (visible only under detection).
    pub is_burrowed: bool,
}

impl Enemy {
    /// Build a full-health enemy of `class` at `position`.
    pub const fn new(tag: UnitTag, class: UnitClass, position: Point) -> Self {
        Self {
            tag,
            position,
            class,
            domain: class.default_domain(),
            health_ratio: 1.0,
            weapon_cooldown: 0.0,
            is_burrowed: false,
        }
    }

    /// Whether this is a static structure rather than a mobile unit.
    pub const fn is_structure(&self) -> bool {
        self.class.is_structure()
    }

    /// Whether this enemy walks on the ground.
    pub fn is_ground(&self) -> bool {
        self.domain == Domain::Ground
    }
}

/// A narrow terrain passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chokepoint {
    /// Center of the passage.
    pub position: Point,
    /// Recorded enemy pressure; decays over time.
    pub threat_level: f64,
}

impl Chokepoint {
    /// A chokepoint with no recorded threat.
    pub const fn new(position: Point) -> Self {
        Self {
            position,
            threat_level: 0.0,
        }
    }
}
