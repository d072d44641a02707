//! Ability gate: validates a cast before it becomes a command.
//!
//! Checks run in a fixed order and stop at the first failure:
//! 1. Caster -- does the class have this ability at all?
//! 2. Research -- is the enabling upgrade done?
//! 3. State -- burrowed/surfaced as the ability requires?
//! 4. Energy -- enough for the cost?
//! 5. Cooldown -- long enough since the last cast?
//! 6. Target -- right kind, finite, in range?

use overmind_types::{AbilityId, AbilityTarget, Agent, Command, UnitClass};

use crate::context::TacticContext;
use crate::error::AbilityError;
use crate::state::TacticalState;

/// Validate `ability` cast by `agent` at `target`.
///
/// # Errors
///
/// Returns the first [`AbilityError`] found by the checks above.
pub fn check_cast(
    agent: &Agent,
    state: &TacticalState,
    ability: AbilityId,
    target: AbilityTarget,
    ctx: &TacticContext<'_>,
) -> Result<Command, AbilityError> {
    match ability {
        AbilityId::BurrowDown | AbilityId::BurrowUp => {
            check_burrow(agent, state, ability, target, ctx)?;
        }
        AbilityId::Explode => check_explode(agent, target)?,
        AbilityId::FungalGrowth => check_fungal(agent, state, target, ctx)?,
    }
    Ok(Command::CastAbility { ability, target })
}

fn check_burrow(
    agent: &Agent,
    state: &TacticalState,
    ability: AbilityId,
    target: AbilityTarget,
    ctx: &TacticContext<'_>,
) -> Result<(), AbilityError> {
    if !agent.class.can_burrow() {
        return Err(AbilityError::InvalidTarget {
            ability,
            reason: "class cannot burrow",
        });
    }
    if !ctx.config.burrow_researched {
        return Err(AbilityError::NotResearched { ability });
    }
    match (ability, agent.is_burrowed) {
        (AbilityId::BurrowDown, true) => {
            return Err(AbilityError::InvalidTarget {
                ability,
                reason: "already burrowed",
            });
        }
        (AbilityId::BurrowUp, false) => {
            return Err(AbilityError::InvalidTarget {
                ability,
                reason: "not burrowed",
            });
        }
        _ => {}
    }
    let cooldown = ctx.config.burrow_toggle_cooldown_ticks;
    if let Some(elapsed) = state.ticks_since_burrow_toggle(ctx.tick)
        && elapsed < cooldown
    {
        return Err(AbilityError::OnCooldown {
            ability,
            remaining_ticks: cooldown.saturating_sub(elapsed),
        });
    }
    if target != AbilityTarget::None {
        return Err(AbilityError::InvalidTarget {
            ability,
            reason: "burrow takes no target",
        });
    }
    Ok(())
}

fn check_explode(agent: &Agent, target: AbilityTarget) -> Result<(), AbilityError> {
    let ability = AbilityId::Explode;
    if agent.class != UnitClass::Baneling {
        return Err(AbilityError::InvalidTarget {
            ability,
            reason: "only banelings explode",
        });
    }
    if target != AbilityTarget::None {
        return Err(AbilityError::InvalidTarget {
            ability,
            reason: "explode takes no target",
        });
    }
    Ok(())
}

fn check_fungal(
    agent: &Agent,
    state: &TacticalState,
    target: AbilityTarget,
    ctx: &TacticContext<'_>,
) -> Result<(), AbilityError> {
    let ability = AbilityId::FungalGrowth;
    if agent.class != UnitClass::Infestor {
        return Err(AbilityError::InvalidTarget {
            ability,
            reason: "only infestors cast fungal growth",
        });
    }
    if agent.is_burrowed {
        return Err(AbilityError::InvalidTarget {
            ability,
            reason: "caster is burrowed",
        });
    }
    let required = ability.energy_cost();
    if agent.energy < required {
        return Err(AbilityError::InsufficientEnergy {
            ability,
            required,
            available: agent.energy,
        });
    }
    let cooldown = ctx.config.fungal_cooldown_ticks;
    if let Some(elapsed) = state.ticks_since_cast(ability, ctx.tick)
        && elapsed < cooldown
    {
        return Err(AbilityError::OnCooldown {
            ability,
            remaining_ticks: cooldown.saturating_sub(elapsed),
        });
    }
    let AbilityTarget::Point(point) = target else {
        return Err(AbilityError::InvalidTarget {
            ability,
            reason: "fungal growth needs a point",
        });
    };
    if !point.is_finite() || point.distance(agent.position) > ctx.config.fungal_range {
        return Err(AbilityError::InvalidTarget {
            ability,
            reason: "target out of range",
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use overmind_steering::{ChokepointCache, FormationConfig};
    use overmind_types::{Point, UnitTag};
    use overmind_world::{GridTerrain, Observation, WorldSnapshot};

    use super::*;
    use crate::config::TacticsConfig;
    use crate::reservation::ReservationTable;

    struct Fixture {
        snapshot: WorldSnapshot,
        terrain: GridTerrain,
        cache: ChokepointCache,
        reservations: ReservationTable,
        config: TacticsConfig,
    }

    impl Fixture {
        fn new(config: TacticsConfig) -> Self {
            let terrain = GridTerrain::new(64, 64).unwrap();
            let snapshot = WorldSnapshot::build(100, Observation::default(), &terrain);
            Self {
                snapshot,
                terrain,
                cache: ChokepointCache::new(&FormationConfig::default()),
                reservations: ReservationTable::new(config.mine_spacing, config.max_active_mines),
                config,
            }
        }

        fn ctx(&self) -> TacticContext<'_> {
            TacticContext {
                tick: 100,
                ticks_per_second: 22.4,
                snapshot: &self.snapshot,
                terrain: &self.terrain,
                chokepoints: &self.cache,
                reservations: &self.reservations,
                config: &self.config,
            }
        }
    }

    fn unit(class: UnitClass) -> Agent {
        Agent::new(UnitTag::new(1), class, Point::new(10.0, 10.0))
    }

    #[test]
    fn burrow_requires_research() {
        let fx = Fixture::new(TacticsConfig {
            burrow_researched: false,
            ..TacticsConfig::default()
        });
        let roach = unit(UnitClass::Roach);
        let state = TacticalState::new(roach.tag, 0);
        let err = check_cast(&roach, &state, AbilityId::BurrowDown, AbilityTarget::None, &fx.ctx())
            .unwrap_err();
        assert_eq!(err, AbilityError::NotResearched { ability: AbilityId::BurrowDown });
    }

    #[test]
    fn burrow_state_must_match() {
        let fx = Fixture::new(TacticsConfig::default());
        let mut roach = unit(UnitClass::Roach);
        let state = TacticalState::new(roach.tag, 0);
        assert!(
            check_cast(&roach, &state, AbilityId::BurrowUp, AbilityTarget::None, &fx.ctx()).is_err()
        );
        roach.is_burrowed = true;
        let cmd = check_cast(&roach, &state, AbilityId::BurrowUp, AbilityTarget::None, &fx.ctx())
            .unwrap();
        assert_eq!(cmd, Command::cast(AbilityId::BurrowUp));
    }

    #[test]
    fn burrow_toggle_cooldown() {
        let fx = Fixture::new(TacticsConfig::default());
        let mut roach = unit(UnitClass::Roach);
        roach.is_burrowed = true;
        let mut state = TacticalState::new(roach.tag, 0);
        state.record_cast(AbilityId::BurrowDown, 98);
        let err = check_cast(&roach, &state, AbilityId::BurrowUp, AbilityTarget::None, &fx.ctx())
            .unwrap_err();
        assert_eq!(
            err,
            AbilityError::OnCooldown {
                ability: AbilityId::BurrowUp,
                remaining_ticks: 4
            }
        );
    }

    #[test]
    fn non_burrowers_are_rejected() {
        let fx = Fixture::new(TacticsConfig::default());
        let muta = unit(UnitClass::Mutalisk);
        let state = TacticalState::new(muta.tag, 0);
        let err = check_cast(&muta, &state, AbilityId::BurrowDown, AbilityTarget::None, &fx.ctx())
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_target");
    }

    #[test]
    fn fungal_checks_energy_cooldown_and_range() {
        let fx = Fixture::new(TacticsConfig::default());
        let mut infestor = unit(UnitClass::Infestor);
        let mut state = TacticalState::new(infestor.tag, 0);
        let near = AbilityTarget::Point(Point::new(15.0, 10.0));

        infestor.energy = 50.0;
        assert!(matches!(
            check_cast(&infestor, &state, AbilityId::FungalGrowth, near, &fx.ctx()),
            Err(AbilityError::InsufficientEnergy { .. })
        ));

        infestor.energy = 100.0;
        state.record_cast(AbilityId::FungalGrowth, 90);
        assert!(matches!(
            check_cast(&infestor, &state, AbilityId::FungalGrowth, near, &fx.ctx()),
            Err(AbilityError::OnCooldown { .. })
        ));

        state.last_cast.clear();
        let far = AbilityTarget::Point(Point::new(40.0, 10.0));
        assert!(matches!(
            check_cast(&infestor, &state, AbilityId::FungalGrowth, far, &fx.ctx()),
            Err(AbilityError::InvalidTarget { reason: "target out of range", .. })
        ));
        assert!(check_cast(&infestor, &state, AbilityId::FungalGrowth, near, &fx.ctx()).is_ok());
    }
}
