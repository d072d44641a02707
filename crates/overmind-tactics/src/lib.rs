//! Ability state machine bank for the Overmind engine.
//!
//! Per-unit-class tactical state machines (area denial, land-mine ambush,
//! explode, regen dance, burrow), the ability gate that validates every cast,
//! the per-agent [`TacticalArena`], and the [`ReservationTable`] that keeps
//! ambush slots spaced apart.

pub mod bank;
pub mod config;
pub mod context;
pub mod error;
pub mod gate;
pub mod reservation;
pub mod state;
pub mod tactics;

pub use bank::{AbilityBank, BankOutcome, TacticFailure};
pub use config::TacticsConfig;
pub use context::TacticContext;
pub use error::{AbilityError, TacticsError};
pub use reservation::{Reservation, ReservationTable, SweepReason};
pub use state::{MinePhase, TacticalArena, TacticalState};
pub use tactics::{ReservationIntent, Tactic, TacticKind, TacticOutcome};
