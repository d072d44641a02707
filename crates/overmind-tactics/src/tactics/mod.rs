//! Per-unit-class tactical state machines.
//!
//! Every state machine implements [`Tactic`]. The closed [`TacticKind`] enum
//! lists them in bank priority order; the bank stops at the first kind whose
//! [`Tactic::can_apply`] holds for an agent, so at most one of them speaks
//! for an agent per cadence.

pub mod area_denial;
pub mod burrow;
pub mod explode;
pub mod mine;
pub mod regen;

use overmind_types::{Agent, Command, Point};

use crate::context::TacticContext;
use crate::error::AbilityError;
use crate::state::TacticalState;

pub use area_denial::AreaDenial;
pub use burrow::Burrow;
pub use explode::Explode;
pub use mine::MineAmbush;
pub use regen::RegenDance;

/// A change a tactic asks the bank to make to the reservation table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReservationIntent {
    /// Reserve this slot for the agent.
    Reserve(Point),
    /// Arm the agent's reservation.
    Arm,
    /// Release the agent's reservation.
    Release,
    /// Refresh the agent's reservation.
    Touch,
}

/// What a tactic wants done for one agent this cadence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TacticOutcome {
    /// Command to issue, if any.
    pub command: Option<Command>,
    /// Reservation change, if any.
    pub reservation: Option<ReservationIntent>,
}

impl TacticOutcome {
    /// No command and no reservation change.
    pub const fn idle() -> Self {
        Self {
            command: None,
            reservation: None,
        }
    }

    /// Issue `command` with no reservation change.
    pub const fn command(command: Command) -> Self {
        Self {
            command: Some(command),
            reservation: None,
        }
    }

    /// Attach a reservation change.
    #[must_use]
    pub const fn with_reservation(mut self, intent: ReservationIntent) -> Self {
        self.reservation = Some(intent);
        self
    }
}

/// One per-class tactical state machine.
pub trait Tactic {
    /// Which kind this is.
    fn kind(&self) -> TacticKind;

    /// Whether this tactic takes charge of `agent` this cadence.
    fn can_apply(&self, agent: &Agent, state: &TacticalState, ctx: &TacticContext<'_>) -> bool;

    /// Advance the state machine and propose at most one command.
    ///
    /// # Errors
    ///
    /// Returns [`AbilityError`] when the cast the tactic needs is refused.
    /// The agent's state is left as it was before the refused transition.
    fn evaluate(
        &self,
        agent: &Agent,
        state: &mut TacticalState,
        ctx: &TacticContext<'_>,
    ) -> Result<TacticOutcome, AbilityError>;
}

/// All tactics, in bank priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TacticKind {
    /// Lurker and infestor positioning, with the low-health escape.
    AreaDenial,
    /// Baneling land-mine ambush.
    MineAmbush,
    /// Surfaced baneling detonation.
    Explode,
    /// Mutalisk regeneration retreat.
    RegenDance,
    /// Generic burrow and unburrow, with baneling and lurker overrides.
    Burrow,
}

impl TacticKind {
    /// Every kind, highest priority first.
    pub const PRIORITY: [Self; 5] = [
        Self::AreaDenial,
        Self::MineAmbush,
        Self::Explode,
        Self::RegenDance,
        Self::Burrow,
    ];

    /// The state machine implementing this kind.
    pub fn handler(self) -> &'static dyn Tactic {
        match self {
            Self::AreaDenial => &AreaDenial,
            Self::MineAmbush => &MineAmbush,
            Self::Explode => &Explode,
            Self::RegenDance => &RegenDance,
            Self::Burrow => &Burrow,
        }
    }

    /// Short name for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::AreaDenial => "area_denial",
            Self::MineAmbush => "mine_ambush",
            Self::Explode => "explode",
            Self::RegenDance => "regen_dance",
            Self::Burrow => "burrow",
        }
    }
}

impl core::fmt::Display for TacticKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
