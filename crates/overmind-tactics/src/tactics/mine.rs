//! Land-mine ambush for banelings: `Unassigned -> Deploying -> Armed`.
//!
//! An idle surfaced baneling with no enemy in sight picks a slot from a
//! prioritized search and reserves it while it walks there. On station it
//! burrows and the reservation is armed. Any enemy ground unit inside
//! `unburrow_range` makes an armed mine surface and release its slot, even a
//! lone scout. Detonation is left to the explode tactic once surfaced.
//!
//! Slot search order:
//! 1. chokepoints near own bases (main first), center then a ring around it
//! 2. the enemy natural's approach toward the map center
//! 3. the map center and two rings around it
//!
//! Candidates must be traversable and respect the reservation spacing.

use overmind_types::{AbilityId, AbilityTarget, Agent, Command, Point, UnitClass, Vec2};

use super::{ReservationIntent, Tactic, TacticKind, TacticOutcome};
use crate::context::TacticContext;
use crate::error::AbilityError;
use crate::state::{MinePhase, TacticalState};

/// Slots per ring around a seed point.
const RING_SLOTS: u32 = 6;

/// Distances along the enemy natural's approach.
const APPROACH_STEPS: [f64; 3] = [8.0, 14.0, 20.0];

/// Baneling land-mine state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct MineAmbush;

impl Tactic for MineAmbush {
    fn kind(&self) -> TacticKind {
        TacticKind::MineAmbush
    }

    fn can_apply(&self, agent: &Agent, state: &TacticalState, ctx: &TacticContext<'_>) -> bool {
        if agent.class != UnitClass::Baneling || !ctx.config.burrow_researched {
            return false;
        }
        if state.mine_phase != MinePhase::Unassigned {
            return true;
        }
        agent.is_idle
            && !agent.is_burrowed
            && ctx.reservations.len() < ctx.config.max_active_mines
            && !ctx.any_enemy_unit_within(agent.position, ctx.config.ambush_range)
    }

    fn evaluate(
        &self,
        agent: &Agent,
        state: &mut TacticalState,
        ctx: &TacticContext<'_>,
    ) -> Result<TacticOutcome, AbilityError> {
        match state.mine_phase {
            MinePhase::Unassigned => Ok(assign(agent, state, ctx)),
            MinePhase::Deploying => deploy(agent, state, ctx),
            MinePhase::Armed => hold(agent, state, ctx),
        }
    }
}

fn assign(agent: &Agent, state: &mut TacticalState, ctx: &TacticContext<'_>) -> TacticOutcome {
    let Some(slot) = find_mine_position(agent, ctx) else {
        return TacticOutcome::idle();
    };
    state.mine_phase = MinePhase::Deploying;
    state.active_mine_position = Some(slot);
    TacticOutcome::command(Command::MoveTo(slot)).with_reservation(ReservationIntent::Reserve(slot))
}

fn deploy(
    agent: &Agent,
    state: &mut TacticalState,
    ctx: &TacticContext<'_>,
) -> Result<TacticOutcome, AbilityError> {
    let held = ctx.reservations.get(agent.tag).map(|r| r.position);
    let (Some(slot), Some(_)) = (state.active_mine_position, held) else {
        // Slot lost (swept or never granted): start over next cadence.
        state.reset_mine();
        return Ok(TacticOutcome::idle().with_reservation(ReservationIntent::Release));
    };

    if ctx
        .nearest_ground_enemy(agent.position)
        .is_some_and(|(_, d)| d <= ctx.config.unburrow_range)
    {
        state.reset_mine();
        return Ok(TacticOutcome::idle().with_reservation(ReservationIntent::Release));
    }

    if agent.position.distance(slot) > ctx.config.mine_arrival_radius {
        let walk = TacticOutcome::command(Command::MoveTo(slot));
        return Ok(walk.with_reservation(ReservationIntent::Touch));
    }

    if agent.is_burrowed {
        state.mine_phase = MinePhase::Armed;
        return Ok(TacticOutcome::idle().with_reservation(ReservationIntent::Arm));
    }
    let burrow = ctx.cast(agent, state, AbilityId::BurrowDown, AbilityTarget::None)?;
    state.mine_phase = MinePhase::Armed;
    Ok(TacticOutcome::command(burrow).with_reservation(ReservationIntent::Arm))
}

fn hold(
    agent: &Agent,
    state: &mut TacticalState,
    ctx: &TacticContext<'_>,
) -> Result<TacticOutcome, AbilityError> {
    if !agent.is_burrowed {
        // Surfaced by something outside the engine; the slot is void.
        state.reset_mine();
        return Ok(TacticOutcome::idle().with_reservation(ReservationIntent::Release));
    }
    let triggered = ctx
        .nearest_ground_enemy(agent.position)
        .is_some_and(|(_, d)| d <= ctx.config.unburrow_range);
    if !triggered {
        return Ok(TacticOutcome::idle().with_reservation(ReservationIntent::Touch));
    }
    let surface = ctx.cast(agent, state, AbilityId::BurrowUp, AbilityTarget::None)?;
    state.reset_mine();
    Ok(TacticOutcome::command(surface).with_reservation(ReservationIntent::Release))
}

/// First acceptable slot for `agent`, in search priority order.
pub fn find_mine_position(agent: &Agent, ctx: &TacticContext<'_>) -> Option<Point> {
    let spacing = ctx.reservations.spacing();
    mine_candidates(ctx, spacing).into_iter().find(|p| {
        p.is_finite()
            && ctx.terrain.is_traversable(*p)
            && ctx.reservations.can_reserve(*p, agent.tag)
    })
}

/// Every candidate slot, highest priority first.
pub fn mine_candidates(ctx: &TacticContext<'_>, spacing: f64) -> Vec<Point> {
    let snapshot = ctx.snapshot;
    let mut candidates = Vec::new();

    for base in snapshot.own_bases() {
        for choke in ctx.chokepoints.near(*base, ctx.config.mine_base_radius) {
            candidates.push(choke.position);
            candidates.extend(ring(choke.position, spacing));
        }
    }

    if let Some(natural) = snapshot.enemy_natural() {
        let center = snapshot.map_center();
        let approach = (center - natural).normalized();
        if !approach.is_zero() {
            let lateral = approach.perpendicular() * spacing;
            for step in APPROACH_STEPS {
                let point = natural + approach * step;
                candidates.push(point);
                candidates.push(point + lateral);
                candidates.push(point - lateral);
            }
        }
    }

    let center = snapshot.map_center();
    candidates.push(center);
    candidates.extend(ring(center, spacing));
    candidates.extend(ring(center, spacing * 2.0));
    candidates
}

/// `RING_SLOTS` points evenly spaced on a circle of `radius` around `seed`.
fn ring(seed: Point, radius: f64) -> impl Iterator<Item = Point> {
    let step = core::f64::consts::TAU / f64::from(RING_SLOTS);
    (0..RING_SLOTS).map(move |i| seed + Vec2::from_angle(step * f64::from(i)) * radius)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use overmind_world::Observation;

    use super::super::fixture::{Fixture, foe, unit};
    use super::*;

    fn armed_fixture(enemy_distance: Option<f64>) -> (Fixture, Agent, TacticalState) {
        let slot = Point::new(30.0, 30.0);
        let mut baneling = unit(5, UnitClass::Baneling, slot.x, slot.y);
        baneling.is_burrowed = true;
        let enemies = enemy_distance
            .map(|d| vec![foe(90, UnitClass::Reaper, slot.x + d, slot.y)])
            .unwrap_or_default();
        let mut fx = Fixture::new(
            200,
            Observation {
                agents: vec![baneling.clone()],
                enemies,
                ..Observation::default()
            },
            Vec::new(),
        );
        fx.reservations.reserve(baneling.tag, slot, 100).unwrap();
        fx.reservations.arm(baneling.tag, 120).unwrap();
        let mut state = TacticalState::new(baneling.tag, 100);
        state.mine_phase = MinePhase::Armed;
        state.active_mine_position = Some(slot);
        (fx, baneling, state)
    }

    #[test]
    fn armed_mine_surfaces_when_enemy_enters_unburrow_range() {
        let (fx, baneling, mut state) = armed_fixture(Some(2.0));
        let out = MineAmbush.evaluate(&baneling, &mut state, &fx.ctx()).unwrap();
        assert_eq!(out.command, Some(Command::cast(AbilityId::BurrowUp)));
        assert_eq!(out.reservation, Some(ReservationIntent::Release));
        assert_eq!(state.mine_phase, MinePhase::Unassigned);
        assert!(state.active_mine_position.is_none());
    }

    #[test]
    fn armed_mine_stays_hidden_when_enemy_is_outside_range() {
        let (fx, baneling, mut state) = armed_fixture(Some(5.0));
        let out = MineAmbush.evaluate(&baneling, &mut state, &fx.ctx()).unwrap();
        assert!(out.command.is_none());
        assert_eq!(out.reservation, Some(ReservationIntent::Touch));
        assert_eq!(state.mine_phase, MinePhase::Armed);
    }

    #[test]
    fn idle_baneling_reserves_ramp_near_own_base_first() {
        let ramp = Point::new(21.0, 16.0);
        let baneling = unit(5, UnitClass::Baneling, 10.0, 10.0);
        let fx = Fixture::new(
            0,
            Observation {
                agents: vec![baneling.clone()],
                own_bases: vec![Point::new(10.0, 10.0)],
                enemy_bases: vec![Point::new(86.0, 86.0), Point::new(64.0, 84.0)],
                ..Observation::default()
            },
            vec![ramp, Point::new(75.0, 80.0)],
        );
        let mut state = TacticalState::new(baneling.tag, 0);
        assert!(MineAmbush.can_apply(&baneling, &state, &fx.ctx()));
        let out = MineAmbush.evaluate(&baneling, &mut state, &fx.ctx()).unwrap();
        assert_eq!(out.command, Some(Command::MoveTo(ramp)));
        assert_eq!(out.reservation, Some(ReservationIntent::Reserve(ramp)));
        assert_eq!(state.mine_phase, MinePhase::Deploying);
    }

    #[test]
    fn search_skips_slots_too_close_to_existing_mines() {
        let ramp = Point::new(21.0, 16.0);
        let baneling = unit(6, UnitClass::Baneling, 10.0, 10.0);
        let mut fx = Fixture::new(
            0,
            Observation {
                agents: vec![baneling.clone()],
                own_bases: vec![Point::new(10.0, 10.0)],
                ..Observation::default()
            },
            vec![ramp],
        );
        fx.reservations.reserve(overmind_types::UnitTag::new(99), ramp, 0).unwrap();
        let slot = find_mine_position(&baneling, &fx.ctx()).unwrap();
        assert!(slot.distance(ramp) >= fx.reservations.spacing() - 1e-9);
    }

    #[test]
    fn deploying_baneling_burrows_and_arms_on_station() {
        let slot = Point::new(40.0, 40.0);
        let baneling = unit(5, UnitClass::Baneling, 40.5, 40.0);
        let mut fx = Fixture::new(
            50,
            Observation {
                agents: vec![baneling.clone()],
                ..Observation::default()
            },
            Vec::new(),
        );
        fx.reservations.reserve(baneling.tag, slot, 10).unwrap();
        let mut state = TacticalState::new(baneling.tag, 10);
        state.mine_phase = MinePhase::Deploying;
        state.active_mine_position = Some(slot);

        let out = MineAmbush.evaluate(&baneling, &mut state, &fx.ctx()).unwrap();
        assert_eq!(out.command, Some(Command::cast(AbilityId::BurrowDown)));
        assert_eq!(out.reservation, Some(ReservationIntent::Arm));
        assert_eq!(state.mine_phase, MinePhase::Armed);
    }

    #[test]
    fn deploying_without_reservation_resets() {
        let baneling = unit(5, UnitClass::Baneling, 10.0, 10.0);
        let fx = Fixture::new(
            50,
            Observation {
                agents: vec![baneling.clone()],
                ..Observation::default()
            },
            Vec::new(),
        );
        let mut state = TacticalState::new(baneling.tag, 10);
        state.mine_phase = MinePhase::Deploying;
        state.active_mine_position = Some(Point::new(40.0, 40.0));
        let out = MineAmbush.evaluate(&baneling, &mut state, &fx.ctx()).unwrap();
        assert!(out.command.is_none());
        assert_eq!(state.mine_phase, MinePhase::Unassigned);
    }

    #[test]
    fn busy_or_threatened_banelings_do_not_deploy() {
        let mut baneling = unit(5, UnitClass::Baneling, 10.0, 10.0);
        baneling.is_idle = false;
        let fx = Fixture::new(
            0,
            Observation {
                agents: vec![baneling.clone()],
                enemies: vec![foe(90, UnitClass::Marine, 14.0, 10.0)],
                ..Observation::default()
            },
            Vec::new(),
        );
        let state = TacticalState::new(baneling.tag, 0);
        assert!(!MineAmbush.can_apply(&baneling, &state, &fx.ctx()));
        baneling.is_idle = true;
        assert!(!MineAmbush.can_apply(&baneling, &state, &fx.ctx()));
    }
}
