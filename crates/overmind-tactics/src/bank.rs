//! The ability state machine bank.
//!
//! Runs on the ability cadence. For every agent in tag order, the first
//! [`TacticKind`] whose `can_apply` holds evaluates it; the proposed command
//! is collected and the agent joins the acted set so the movement stage
//! leaves it alone. Reservation intents are applied before the next agent is
//! evaluated, so a slot taken by one baneling is already visible to the next.

use std::collections::{BTreeMap, BTreeSet};

use overmind_steering::ChokepointCache;
use overmind_types::{Command, UnitTag};
use overmind_world::{TerrainOracle, WorldSnapshot};
use tracing::{debug, trace};

use crate::config::TacticsConfig;
use crate::context::TacticContext;
use crate::error::{AbilityError, TacticsError};
use crate::reservation::ReservationTable;
use crate::state::{TacticalArena, TacticalState};
use crate::tactics::{ReservationIntent, TacticKind};

/// A per-agent failure inside the bank. The agent is skipped for the tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TacticFailure {
    /// The tactic's cast was refused by the ability gate.
    Ability {
        /// The agent.
        tag: UnitTag,
        /// The tactic that asked for the cast.
        tactic: TacticKind,
        /// Why the gate refused it.
        error: AbilityError,
    },
    /// The tactic's reservation change was rejected.
    Reservation {
        /// The agent.
        tag: UnitTag,
        /// Why the table rejected it.
        error: TacticsError,
    },
}

impl TacticFailure {
    /// The agent that failed.
    pub const fn tag(&self) -> UnitTag {
        match self {
            Self::Ability { tag, .. } | Self::Reservation { tag, .. } => *tag,
        }
    }

    /// Stable error kind, used as a log-throttle key.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Ability { error, .. } => error.kind(),
            Self::Reservation { error, .. } => error.kind(),
        }
    }
}

impl core::fmt::Display for TacticFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Ability { tactic, error, .. } => write!(f, "{tactic}: {error}"),
            Self::Reservation { error, .. } => write!(f, "reservation: {error}"),
        }
    }
}

/// Result of one bank pass.
#[derive(Debug, Clone, Default)]
pub struct BankOutcome {
    /// At most one command per agent.
    pub commands: BTreeMap<UnitTag, Command>,
    /// Agents that received a command (the movement skip set).
    pub acted: BTreeSet<UnitTag>,
    /// Per-agent failures, in tag order.
    pub failures: Vec<TacticFailure>,
}

/// Runs the tactical state machines for every agent.
#[derive(Debug, Clone)]
pub struct AbilityBank {
    config: TacticsConfig,
    ticks_per_second: f64,
}

impl AbilityBank {
    /// Create a bank.
    pub const fn new(config: TacticsConfig, ticks_per_second: f64) -> Self {
        Self {
            config,
            ticks_per_second,
        }
    }

    /// The bank's configuration.
    pub const fn config(&self) -> &TacticsConfig {
        &self.config
    }

    /// Run one pass over every agent in `snapshot`.
    pub fn run(
        &self,
        snapshot: &WorldSnapshot,
        terrain: &dyn TerrainOracle,
        chokepoints: &ChokepointCache,
        arena: &mut TacticalArena,
        reservations: &mut ReservationTable,
    ) -> BankOutcome {
        let tick = snapshot.tick();
        let mut outcome = BankOutcome::default();

        for agent in snapshot.agents() {
            if !agent.position.is_finite() {
                continue;
            }
            let state = arena.entry(agent.tag, tick);
            let ctx = TacticContext {
                tick,
                ticks_per_second: self.ticks_per_second,
                snapshot,
                terrain,
                chokepoints,
                reservations: &*reservations,
                config: &self.config,
            };
            let Some(kind) = TacticKind::PRIORITY
                .into_iter()
                .find(|kind| kind.handler().can_apply(agent, &*state, &ctx))
            else {
                continue;
            };
            let proposal = kind.handler().evaluate(agent, state, &ctx);

            let proposal = match proposal {
                Ok(proposal) => proposal,
                Err(error) => {
                    trace!(tick, tag = %agent.tag, tactic = %kind, %error, "cast refused");
                    outcome.failures.push(TacticFailure::Ability {
                        tag: agent.tag,
                        tactic: kind,
                        error,
                    });
                    continue;
                }
            };

            if let Some(intent) = proposal.reservation
                && let Err(error) = apply_intent(reservations, state, intent, tick)
            {
                outcome.failures.push(TacticFailure::Reservation { tag: agent.tag, error });
                if matches!(intent, ReservationIntent::Reserve(_)) {
                    continue;
                }
            }

            if let Some(command) = proposal.command {
                if let Some(ability) = command.ability() {
                    state.record_cast(ability, tick);
                }
                debug!(tick, tag = %agent.tag, tactic = %kind, ?command, "tactic command");
                outcome.commands.insert(agent.tag, command);
                outcome.acted.insert(agent.tag);
            }
        }

        outcome
    }
}

/// Apply a reservation intent for `state`'s agent.
///
/// A rejected reservation or arm drops the agent back to `Unassigned`.
fn apply_intent(
    reservations: &mut ReservationTable,
    state: &mut TacticalState,
    intent: ReservationIntent,
    tick: u64,
) -> Result<(), TacticsError> {
    let owner = state.tag;
    let applied = match intent {
        ReservationIntent::Reserve(position) => reservations.reserve(owner, position, tick),
        ReservationIntent::Arm => reservations.arm(owner, tick),
        ReservationIntent::Release => {
            reservations.release(owner);
            Ok(())
        }
        ReservationIntent::Touch => {
            reservations.touch(owner, tick);
            Ok(())
        }
    };
    if applied.is_err() {
        state.reset_mine();
    }
    applied
}
