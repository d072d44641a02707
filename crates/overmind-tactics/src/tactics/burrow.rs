//! Generic burrow/unburrow, with baneling and lurker overrides.

use overmind_types::{AbilityId, AbilityTarget, Agent, UnitClass};

use super::{Tactic, TacticKind, TacticOutcome};
use crate::context::TacticContext;
use crate::error::AbilityError;
use crate::state::TacticalState;

/// Burrow toggling for every burrow-capable class.
///
/// - Generic: burrow to survive (low health, enemy close), surface once
///   healed or alone.
/// - Baneling: burrow idle next to the enemy, surface when a ground unit
///   walks into `unburrow_range`.
/// - Lurker: burrow to fire at ground units in range, surface when nothing
///   is left within range plus `lurker_release_margin`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Burrow;

impl Tactic for Burrow {
    fn kind(&self) -> TacticKind {
        TacticKind::Burrow
    }

    fn can_apply(&self, agent: &Agent, _state: &TacticalState, ctx: &TacticContext<'_>) -> bool {
        agent.class.can_burrow()
            && ctx.config.burrow_researched
            && desired_toggle(agent, ctx).is_some()
    }

    fn evaluate(
        &self,
        agent: &Agent,
        state: &mut TacticalState,
        ctx: &TacticContext<'_>,
    ) -> Result<TacticOutcome, AbilityError> {
        let Some(ability) = desired_toggle(agent, ctx) else {
            return Ok(TacticOutcome::idle());
        };
        let command = ctx.cast(agent, state, ability, AbilityTarget::None)?;
        Ok(TacticOutcome::command(command))
    }
}

/// The burrow toggle `agent` wants right now, if any.
pub fn desired_toggle(agent: &Agent, ctx: &TacticContext<'_>) -> Option<AbilityId> {
    match agent.class {
        UnitClass::Baneling => baneling_toggle(agent, ctx),
        UnitClass::Lurker => lurker_toggle(agent, ctx),
        _ => generic_toggle(agent, ctx),
    }
}

fn baneling_toggle(agent: &Agent, ctx: &TacticContext<'_>) -> Option<AbilityId> {
    let cfg = ctx.config;
    let nearest = ctx.nearest_ground_enemy(agent.position).map(|(_, d)| d);
    if agent.is_burrowed {
        return nearest
            .is_some_and(|d| d <= cfg.unburrow_range)
            .then_some(AbilityId::BurrowUp);
    }
    let lurking = agent.is_idle
        && ctx.any_enemy_unit_within(agent.position, cfg.ambush_range)
        && nearest.is_none_or(|d| d > cfg.unburrow_range);
    lurking.then_some(AbilityId::BurrowDown)
}

fn lurker_toggle(agent: &Agent, ctx: &TacticContext<'_>) -> Option<AbilityId> {
    let range = agent.class.attack_range();
    let nearest = ctx.nearest_ground_enemy(agent.position).map(|(_, d)| d);
    if agent.is_burrowed {
        let release = range + ctx.config.lurker_release_margin;
        return nearest
            .is_none_or(|d| d > release)
            .then_some(AbilityId::BurrowUp);
    }
    nearest
        .is_some_and(|d| d <= range)
        .then_some(AbilityId::BurrowDown)
}

fn generic_toggle(agent: &Agent, ctx: &TacticContext<'_>) -> Option<AbilityId> {
    let cfg = ctx.config;
    let threatened = ctx.any_enemy_unit_within(agent.position, cfg.burrow_enemy_radius);
    if agent.is_burrowed {
        let recovered = agent.health_ratio > cfg.unburrow_health_threshold;
        return (recovered || !threatened).then_some(AbilityId::BurrowUp);
    }
    let weak = agent.health_ratio < cfg.burrow_health_threshold;
    (weak && threatened).then_some(AbilityId::BurrowDown)
}
