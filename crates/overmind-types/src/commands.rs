//! Command types exchanged with the external command sink.
//!
//! The engine proposes at most one [`Command`] per agent per tick and ships
//! all of them together as a single [`CommandBatch`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::AbilityId;
use crate::geometry::Point;
use crate::ids::{BatchId, UnitTag};

/// Optional target of an ability cast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AbilityTarget {
    /// Self-cast or untargeted.
    None,
    /// Ground-targeted cast.
    Point(Point),
    /// Unit-targeted cast.
    Unit(UnitTag),
}

/// One order for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Move to a map position.
    MoveTo(Point),
    /// Attack a specific enemy.
    AttackTarget(UnitTag),
    /// Cast an ability.
    CastAbility {
        /// The ability to cast.
        ability: AbilityId,
        /// The cast target.
        target: AbilityTarget,
    },
}

impl Command {
    /// Shorthand for an untargeted cast.
    pub const fn cast(ability: AbilityId) -> Self {
        Self::CastAbility {
            ability,
            target: AbilityTarget::None,
        }
    }

    /// Whether this is an ability cast.
    pub const fn is_ability(&self) -> bool {
        matches!(self, Self::CastAbility { .. })
    }

    /// The ability id, if this is a cast.
    pub const fn ability(&self) -> Option<AbilityId> {
        match self {
            Self::CastAbility { ability, .. } => Some(*ability),
            Self::MoveTo(_) | Self::AttackTarget(_) => None,
        }
    }
}

/// Which engine stage produced a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CommandOrigin {
    /// The ability state machine bank.
    Ability,
    /// The primary steering pipeline.
    Movement,
    /// The spacing-only fallback pass.
    Fallback,
}

/// A command addressed to one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IssuedCommand {
    /// The agent receiving the order.
    pub tag: UnitTag,
    /// The order itself.
    pub command: Command,
    /// The stage that produced it.
    pub origin: CommandOrigin,
}

/// All commands produced in one tick, dispatched as one unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandBatch {
    /// Correlation id for logs.
    pub id: BatchId,
    /// Tick that produced the batch.
    pub tick: u64,
    /// Wall-clock time the batch was sealed.
    pub dispatched_at: DateTime<Utc>,
    /// Commands ordered by agent tag; at most one per tag.
    pub commands: Vec<IssuedCommand>,
}

impl CommandBatch {
    /// Number of commands in the batch.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the batch carries no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The command issued to `tag`, if any.
    pub fn command_for(&self, tag: UnitTag) -> Option<&IssuedCommand> {
        self.commands.iter().find(|c| c.tag == tag)
    }
}
