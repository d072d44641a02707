//! Mutalisk regen dance: retreat at low health, return once healed.
//!
//! `Combat -> Regenerating` below `regen_threshold`. The exit fires on the
//! health target or the minimum dwell, whichever comes first, but never
//! before the minimum dwell: a unit that heals quickly still stays out for
//! the full minimum. Re-entry is blocked for `regen_cooldown` ticks after an
//! exit.

use overmind_types::{Agent, Command, Point};
use tracing::debug;

use super::{Tactic, TacticKind, TacticOutcome};
use crate::context::TacticContext;
use crate::error::AbilityError;
use crate::state::TacticalState;

/// How far to fall back from the nearest enemy when no base is known.
const RETREAT_DISTANCE: f64 = 10.0;

/// Regeneration retreat for regen-dancing flyers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegenDance;

impl Tactic for RegenDance {
    fn kind(&self) -> TacticKind {
        TacticKind::RegenDance
    }

    fn can_apply(&self, agent: &Agent, state: &TacticalState, ctx: &TacticContext<'_>) -> bool {
        if !agent.class.regen_dances() || !agent.is_flying() {
            return false;
        }
        state.is_regenerating() || should_enter(agent, state, ctx)
    }

    fn evaluate(
        &self,
        agent: &Agent,
        state: &mut TacticalState,
        ctx: &TacticContext<'_>,
    ) -> Result<TacticOutcome, AbilityError> {
        if let Some(since) = state.regenerating_since {
            let dwell = ctx.seconds_since(since);
            if dwell >= ctx.config.regen_min_dwell_seconds {
                let healed = agent.health_ratio >= ctx.config.regen_target;
                state.regenerating_since = None;
                state.regen_exited_at = Some(ctx.tick);
                debug!(tag = %agent.tag, dwell, healed, "regen dance finished");
                return Ok(TacticOutcome::idle());
            }
            return Ok(retreat(agent, ctx));
        }

        if !should_enter(agent, state, ctx) {
            return Ok(TacticOutcome::idle());
        }
        state.regenerating_since = Some(ctx.tick);
        debug!(tag = %agent.tag, health = agent.health_ratio, "regen dance started");
        Ok(retreat(agent, ctx))
    }
}

fn should_enter(agent: &Agent, state: &TacticalState, ctx: &TacticContext<'_>) -> bool {
    if agent.health_ratio >= ctx.config.regen_threshold {
        return false;
    }
    state
        .regen_exited_at
        .is_none_or(|exited| ctx.tick.saturating_sub(exited) >= ctx.config.regen_cooldown)
}

fn retreat(agent: &Agent, ctx: &TacticContext<'_>) -> TacticOutcome {
    safe_point(agent, ctx)
        .map_or_else(TacticOutcome::idle, |p| TacticOutcome::command(Command::MoveTo(p)))
}

/// Nearest own base, or a point directly away from the nearest enemy.
pub fn safe_point(agent: &Agent, ctx: &TacticContext<'_>) -> Option<Point> {
    if let Some(base) = ctx.snapshot.nearest_own_base(agent.position) {
        return Some(base);
    }
    let (enemy, _) = ctx.snapshot.nearest_enemy(agent.position, |e| !e.is_structure())?;
    let away = (agent.position - enemy.position).normalized();
    if away.is_zero() {
        return None;
    }
    Some(agent.position + away * RETREAT_DISTANCE)
}
