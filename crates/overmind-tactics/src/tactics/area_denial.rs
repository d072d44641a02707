//! Area denial and infiltration for lurkers and infestors.
//!
//! Lurkers hold the most threatened chokepoint and burrow on it. Infestors
//! infiltrate the enemy main, travelling burrowed when tunneling claws are
//! done, and surface to land fungal growth on a cluster. Both break off to
//! the nearest own base below `escape_health_threshold` and stay in escape
//! until healed past `unburrow_health_threshold`.
//!
//! Firing for lurkers is the burrow machine's job: this tactic only takes a
//! lurker while no ground enemy is within its range plus the release margin.

use overmind_types::{AbilityId, AbilityTarget, Agent, Command, Point, UnitClass};
use tracing::debug;

use super::{Tactic, TacticKind, TacticOutcome};
use crate::context::TacticContext;
use crate::error::AbilityError;
use crate::state::TacticalState;

/// Lurker and infestor positioning.
#[derive(Debug, Clone, Copy, Default)]
pub struct AreaDenial;

impl Tactic for AreaDenial {
    fn kind(&self) -> TacticKind {
        TacticKind::AreaDenial
    }

    fn can_apply(&self, agent: &Agent, state: &TacticalState, ctx: &TacticContext<'_>) -> bool {
        if !matches!(agent.class, UnitClass::Lurker | UnitClass::Infestor) {
            return false;
        }
        if state.escaping || agent.health_ratio < ctx.config.escape_health_threshold {
            return true;
        }
        match agent.class {
            UnitClass::Lurker => !lurker_engaged(agent, ctx) && lurker_target(state, ctx).is_some(),
            _ => infestor_target(state, ctx).is_some(),
        }
    }

    fn evaluate(
        &self,
        agent: &Agent,
        state: &mut TacticalState,
        ctx: &TacticContext<'_>,
    ) -> Result<TacticOutcome, AbilityError> {
        let cfg = ctx.config;
        let recovered = agent.health_ratio > cfg.unburrow_health_threshold;
        if (state.escaping && !recovered) || agent.health_ratio < cfg.escape_health_threshold {
            let outcome = escape(agent, state, ctx)?;
            if !state.escaping {
                debug!(tag = %agent.tag, health = agent.health_ratio, "escaping to base");
            }
            state.escaping = true;
            state.infiltration_target = None;
            return Ok(outcome);
        }
        state.escaping = false;

        let target = match agent.class {
            UnitClass::Lurker if lurker_engaged(agent, ctx) => return Ok(TacticOutcome::idle()),
            UnitClass::Lurker => lurker_target(state, ctx),
            _ => infestor_target(state, ctx),
        };
        let Some(target) = target else {
            state.infiltration_target = None;
            return Ok(TacticOutcome::idle());
        };

        let outcome = if agent.class == UnitClass::Infestor {
            infestor_step(agent, state, ctx, target)?
        } else {
            lurker_step(agent, state, ctx, target)?
        };
        state.infiltration_target = Some(target);
        Ok(outcome)
    }
}

fn escape(
    agent: &Agent,
    state: &TacticalState,
    ctx: &TacticContext<'_>,
) -> Result<TacticOutcome, AbilityError> {
    if agent.is_burrowed && !moves_burrowed(agent, ctx) {
        let surface = ctx.cast(agent, state, AbilityId::BurrowUp, AbilityTarget::None)?;
        return Ok(TacticOutcome::command(surface));
    }
    Ok(ctx
        .snapshot
        .nearest_own_base(agent.position)
        .map_or_else(TacticOutcome::idle, |base| TacticOutcome::command(Command::MoveTo(base))))
}

fn lurker_step(
    agent: &Agent,
    state: &TacticalState,
    ctx: &TacticContext<'_>,
    target: Point,
) -> Result<TacticOutcome, AbilityError> {
    let arrived = agent.position.distance(target) <= ctx.config.arrival_radius;
    match (arrived, agent.is_burrowed) {
        (true, false) => cast(agent, state, ctx, AbilityId::BurrowDown),
        (true, true) => Ok(TacticOutcome::idle()),
        (false, true) => cast(agent, state, ctx, AbilityId::BurrowUp),
        (false, false) => Ok(TacticOutcome::command(Command::MoveTo(target))),
    }
}

fn infestor_step(
    agent: &Agent,
    state: &TacticalState,
    ctx: &TacticContext<'_>,
    target: Point,
) -> Result<TacticOutcome, AbilityError> {
    if fungal_ready(agent, state, ctx)
        && let Some(cluster) = fungal_cluster(agent, ctx)
    {
        if agent.is_burrowed {
            return cast(agent, state, ctx, AbilityId::BurrowUp);
        }
        let command =
            ctx.cast(agent, state, AbilityId::FungalGrowth, AbilityTarget::Point(cluster))?;
        debug!(tag = %agent.tag, x = cluster.x, y = cluster.y, "fungal growth");
        return Ok(TacticOutcome::command(command));
    }

    let arrived = agent.position.distance(target) <= ctx.config.arrival_radius;
    if arrived {
        if agent.is_burrowed {
            return cast(agent, state, ctx, AbilityId::BurrowUp);
        }
        return Ok(TacticOutcome::idle());
    }
    if !agent.is_burrowed && moves_burrowed(agent, ctx) {
        return cast(agent, state, ctx, AbilityId::BurrowDown);
    }
    if agent.is_burrowed && !moves_burrowed(agent, ctx) {
        return cast(agent, state, ctx, AbilityId::BurrowUp);
    }
    Ok(TacticOutcome::command(Command::MoveTo(target)))
}

fn cast(
    agent: &Agent,
    state: &TacticalState,
    ctx: &TacticContext<'_>,
    ability: AbilityId,
) -> Result<TacticOutcome, AbilityError> {
    ctx.cast(agent, state, ability, AbilityTarget::None)
        .map(TacticOutcome::command)
}

/// Only infestors with tunneling claws travel underground.
fn moves_burrowed(agent: &Agent, ctx: &TacticContext<'_>) -> bool {
    agent.class == UnitClass::Infestor && ctx.config.tunneling_claws && ctx.config.burrow_researched
}

fn lurker_engaged(agent: &Agent, ctx: &TacticContext<'_>) -> bool {
    let reach = agent.class.attack_range() + ctx.config.lurker_release_margin;
    ctx.nearest_ground_enemy(agent.position)
        .is_some_and(|(_, d)| d <= reach)
}

/// Most threatened chokepoint, else the chokepoint already being held.
fn lurker_target(state: &TacticalState, ctx: &TacticContext<'_>) -> Option<Point> {
    ctx.chokepoints
        .highest_threat()
        .map(|c| c.position)
        .or(state.infiltration_target)
}

/// Current destination, else the enemy main, else the most threatened
/// chokepoint.
fn infestor_target(state: &TacticalState, ctx: &TacticContext<'_>) -> Option<Point> {
    state
        .infiltration_target
        .or_else(|| ctx.snapshot.enemy_main())
        .or_else(|| ctx.chokepoints.highest_threat().map(|c| c.position))
}

fn fungal_ready(agent: &Agent, state: &TacticalState, ctx: &TacticContext<'_>) -> bool {
    let ability = AbilityId::FungalGrowth;
    agent.energy >= ability.energy_cost()
        && state
            .ticks_since_cast(ability, ctx.tick)
            .is_none_or(|elapsed| elapsed >= ctx.config.fungal_cooldown_ticks)
}

/// Centre of the densest enemy clump within cast range, if it is dense
/// enough to be worth the energy.
pub fn fungal_cluster(agent: &Agent, ctx: &TacticContext<'_>) -> Option<Point> {
    let cfg = ctx.config;
    let mut best: Option<(usize, Point)> = None;
    for seed in ctx
        .snapshot
        .hostile_units()
        .filter(|e| e.position.distance(agent.position) <= cfg.fungal_range)
    {
        let members: Vec<Point> = ctx
            .snapshot
            .hostile_units()
            .filter(|e| e.position.distance(seed.position) <= cfg.fungal_radius)
            .map(|e| e.position)
            .collect();
        if best.is_some_and(|(count, _)| count >= members.len()) {
            continue;
        }
        let center = Point::centroid(members.iter().copied())
            .filter(|c| c.distance(agent.position) <= cfg.fungal_range)
            .unwrap_or(seed.position);
        best = Some((members.len(), center));
    }
    best.filter(|(count, _)| *count >= cfg.fungal_min_targets)
        .map(|(_, center)| center)
}
