//! Surfaced baneling detonation.

use overmind_types::{AbilityId, AbilityTarget, Agent, UnitClass};

use super::{Tactic, TacticKind, TacticOutcome};
use crate::context::TacticContext;
use crate::error::AbilityError;
use crate::state::TacticalState;

/// Detonate when enough hostile ground units are packed around a surfaced
/// baneling.
#[derive(Debug, Clone, Copy, Default)]
pub struct Explode;

impl Tactic for Explode {
    fn kind(&self) -> TacticKind {
        TacticKind::Explode
    }

    fn can_apply(&self, agent: &Agent, _state: &TacticalState, ctx: &TacticContext<'_>) -> bool {
        agent.class == UnitClass::Baneling
            && !agent.is_burrowed
            && ctx.ground_enemies_within(agent.position, ctx.config.explode_range)
                >= ctx.config.min_targets_for_explode
    }

    fn evaluate(
        &self,
        agent: &Agent,
        state: &mut TacticalState,
        ctx: &TacticContext<'_>,
    ) -> Result<TacticOutcome, AbilityError> {
        let command = ctx.cast(agent, state, AbilityId::Explode, AbilityTarget::None)?;
        Ok(TacticOutcome::command(command))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use overmind_types::Command;
    use overmind_world::Observation;

    use super::super::fixture::{Fixture, foe, unit};
    use super::*;

    fn fixture(enemies: usize) -> (Fixture, Agent) {
        let baneling = unit(3, UnitClass::Baneling, 50.0, 50.0);
        let enemies = (0..enemies)
            .map(|i| {
                let offset = f64::from(u32::try_from(i).unwrap()) * 0.5;
                foe(100 + u64::try_from(i).unwrap(), UnitClass::Marine, 50.5 + offset, 50.0)
            })
            .collect();
        let fx = Fixture::new(
            10,
            Observation {
                agents: vec![baneling.clone()],
                enemies,
                ..Observation::default()
            },
            Vec::new(),
        );
        (fx, baneling)
    }

    #[test]
    fn explodes_on_a_cluster() {
        let (fx, baneling) = fixture(3);
        let mut state = TacticalState::new(baneling.tag, 0);
        assert!(Explode.can_apply(&baneling, &state, &fx.ctx()));
        let out = Explode.evaluate(&baneling, &mut state, &fx.ctx()).unwrap();
        assert_eq!(out.command, Some(Command::cast(AbilityId::Explode)));
    }

    #[test]
    fn holds_for_too_few_targets() {
        let (fx, baneling) = fixture(2);
        let state = TacticalState::new(baneling.tag, 0);
        assert!(!Explode.can_apply(&baneling, &state, &fx.ctx()));
    }

    #[test]
    fn burrowed_banelings_never_explode() {
        let (fx, mut baneling) = fixture(5);
        baneling.is_burrowed = true;
        let state = TacticalState::new(baneling.tag, 0);
        assert!(!Explode.can_apply(&baneling, &state, &fx.ctx()));
    }
}
