//! Error types for the `overmind-tactics` crate.
//!
//! [`AbilityError`] is what a tactic returns when the cast it wants is not
//! possible. The scheduler treats every variant the same way (skip the agent
//! this tick), but the variants let tests and logs tell the causes apart.
//! [`TacticsError`] covers the reservation table.

use overmind_types::{AbilityId, Point, UnitTag};

/// Why an ability cast was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AbilityError {
    /// The ability was used too recently.
    #[error("{ability:?} on cooldown for {remaining_ticks} more ticks")]
    OnCooldown {
        /// The refused ability.
        ability: AbilityId,
        /// Ticks until it is available again.
        remaining_ticks: u64,
    },

    /// The caster or target is not valid for this ability.
    #[error("invalid target for {ability:?}: {reason}")]
    InvalidTarget {
        /// The refused ability.
        ability: AbilityId,
        /// What was wrong.
        reason: &'static str,
    },

    /// The caster lacks the energy.
    #[error("{ability:?} needs {required} energy, have {available}")]
    InsufficientEnergy {
        /// The refused ability.
        ability: AbilityId,
        /// Energy the cast costs.
        required: f64,
        /// Energy the caster has.
        available: f64,
    },

    /// The upgrade enabling the ability is missing.
    #[error("{ability:?} not researched")]
    NotResearched {
        /// The refused ability.
        ability: AbilityId,
    },
}

impl AbilityError {
    /// Short, stable name of the variant, used as a log-throttle key.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::OnCooldown { .. } => "on_cooldown",
            Self::InvalidTarget { .. } => "invalid_target",
            Self::InsufficientEnergy { .. } => "insufficient_energy",
            Self::NotResearched { .. } => "not_researched",
        }
    }
}

/// Reservation table failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TacticsError {
    /// Another agent already holds a reservation too close to this position.
    #[error("reservation at {position} is {distance:.2} from {holder}'s, spacing is {spacing}")]
    ReservationTooClose {
        /// The requested position.
        position: Point,
        /// The agent holding the conflicting reservation.
        holder: UnitTag,
        /// Distance to the conflicting reservation.
        distance: f64,
        /// Required spacing.
        spacing: f64,
    },

    /// The agent holds no reservation.
    #[error("agent {0} holds no reservation")]
    NoReservation(UnitTag),

    /// The requested position is not finite.
    #[error("invalid reservation position {0}")]
    InvalidPosition(Point),

    /// The reservation table is at capacity.
    #[error("reservation table full ({capacity} active)")]
    TableFull {
        /// Maximum simultaneous reservations.
        capacity: usize,
    },
}

impl TacticsError {
    /// Short, stable name of the variant, used as a log-throttle key.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ReservationTooClose { .. } => "reservation_too_close",
            Self::NoReservation(_) => "no_reservation",
            Self::InvalidPosition(_) => "invalid_position",
            Self::TableFull { .. } => "table_full",
        }
    }
}
