//! Command reconciliation: at most one command per agent per tick.
//!
//! Stages propose commands in any order. An ability command always wins over
//! movement, movement wins over the spacing fallback, and between two
//! proposals of the same origin the first one stands.

use std::collections::BTreeMap;

use chrono::Utc;
use overmind_types::{BatchId, Command, CommandBatch, CommandOrigin, IssuedCommand, UnitTag};

/// Collects proposals for one tick and seals them into a batch.
#[derive(Debug, Clone, Default)]
pub struct CommandReconciler {
    proposals: BTreeMap<UnitTag, (Command, CommandOrigin)>,
    overridden: usize,
}

const fn rank(origin: CommandOrigin) -> u8 {
    match origin {
        CommandOrigin::Ability => 2,
        CommandOrigin::Movement => 1,
        CommandOrigin::Fallback => 0,
    }
}

impl CommandReconciler {
    /// An empty reconciler.
    pub const fn new() -> Self {
        Self {
            proposals: BTreeMap::new(),
            overridden: 0,
        }
    }

    /// Propose `command` for `tag`. Returns whether it is the one kept.
    pub fn propose(&mut self, tag: UnitTag, command: Command, origin: CommandOrigin) -> bool {
        match self.proposals.get(&tag) {
            Some((_, existing)) if rank(*existing) >= rank(origin) => {
                self.overridden = self.overridden.saturating_add(1);
                false
            }
            Some(_) => {
                self.overridden = self.overridden.saturating_add(1);
                self.proposals.insert(tag, (command, origin));
                true
            }
            None => {
                self.proposals.insert(tag, (command, origin));
                true
            }
        }
    }

    /// The command currently kept for `tag`.
    pub fn get(&self, tag: UnitTag) -> Option<(Command, CommandOrigin)> {
        self.proposals.get(&tag).copied()
    }

    /// Number of agents with a command.
    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    /// Whether no commands were proposed.
    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Proposals discarded because another stage already spoke for the agent.
    pub const fn overridden(&self) -> usize {
        self.overridden
    }

    /// Number of kept commands from `origin`.
    pub fn count(&self, origin: CommandOrigin) -> usize {
        self.proposals.values().filter(|(_, o)| *o == origin).count()
    }

    /// Seal the proposals into a batch for `tick`, ordered by tag.
    pub fn finish(self, tick: u64) -> CommandBatch {
        let commands = self
            .proposals
            .into_iter()
            .map(|(tag, (command, origin))| IssuedCommand {
                tag,
                command,
                origin,
            })
            .collect();
        CommandBatch {
            id: BatchId::new(),
            tick,
            dispatched_at: Utc::now(),
            commands,
        }
    }
}

#[cfg(test)]
mod tests {
    use overmind_types::{AbilityId, Point};

    use super::*;

    fn tag(raw: u64) -> UnitTag {
        UnitTag::new(raw)
    }

    #[test]
    fn ability_preempts_movement_regardless_of_order() {
        let burrow = Command::cast(AbilityId::BurrowDown);
        let walk = Command::MoveTo(Point::new(1.0, 1.0));

        let mut first = CommandReconciler::new();
        first.propose(tag(1), walk, CommandOrigin::Movement);
        assert!(first.propose(tag(1), burrow, CommandOrigin::Ability));

        let mut second = CommandReconciler::new();
        second.propose(tag(1), burrow, CommandOrigin::Ability);
        assert!(!second.propose(tag(1), walk, CommandOrigin::Movement));

        for reconciler in [first, second] {
            assert_eq!(reconciler.get(tag(1)), Some((burrow, CommandOrigin::Ability)));
            assert_eq!(reconciler.overridden(), 1);
        }
    }

    #[test]
    fn movement_replaces_fallback() {
        let mut reconciler = CommandReconciler::new();
        reconciler.propose(tag(2), Command::MoveTo(Point::ZERO), CommandOrigin::Fallback);
        reconciler.propose(tag(2), Command::AttackTarget(tag(9)), CommandOrigin::Movement);
        assert_eq!(reconciler.get(tag(2)).map(|(_, o)| o), Some(CommandOrigin::Movement));
    }

    #[test]
    fn batch_has_one_command_per_tag_in_tag_order() {
        let mut reconciler = CommandReconciler::new();
        for raw in [5, 1, 3, 1, 5] {
            reconciler.propose(tag(raw), Command::MoveTo(Point::ZERO), CommandOrigin::Movement);
        }
        let batch = reconciler.finish(12);
        let tags: Vec<u64> = batch.commands.iter().map(|c| u64::from(c.tag)).collect();
        assert_eq!(tags, vec![1, 3, 5]);
        assert_eq!(batch.tick, 12);
    }
}
