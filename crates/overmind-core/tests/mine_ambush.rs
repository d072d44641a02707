//! Land-mine ambush driven through full scheduler passes.
//!
//! Banelings are deployed on the default skirmish map and the reservation
//! table is checked exhaustively after every tick: no two reservations,
//! pending or armed, are ever closer than the configured spacing.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use common::{Sandbox, agent, enemy};
use overmind_core::MicroConfig;
use overmind_tactics::ReservationTable;
use overmind_types::{AbilityId, Command, CommandOrigin, Point, UnitClass, UnitTag, Vec2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn assert_spaced(table: &ReservationTable, tick: u64) {
    let slots: Vec<Point> = table.iter().map(|r| r.position).collect();
    assert!(slots.len() <= 4, "tick {tick}: {} reservations", slots.len());
    for (i, a) in slots.iter().enumerate() {
        for b in slots.iter().skip(i + 1) {
            let d = a.distance(*b);
            assert!(d >= table.spacing(), "tick {tick}: slots {a} and {b} are {d} apart");
        }
    }
}

fn baneling_pack(sandbox: &mut Sandbox, count: u64) {
    for i in 0..count {
        let offset = f64::from(u32::try_from(i).unwrap());
        sandbox
            .world
            .agents
            .push(agent(i + 1, UnitClass::Baneling, 8.0 + offset * 0.8, 8.0));
    }
}

#[test]
fn mines_arm_at_spaced_slots() {
    let mut sandbox = Sandbox::skirmish(MicroConfig::default());
    baneling_pack(&mut sandbox, 6);

    while sandbox.controller.clock().tick() < 17 {
        let out = sandbox.step();
        assert_spaced(sandbox.controller.reservations(), out.report.tick);
    }

    let table = sandbox.controller.reservations();
    assert_eq!(table.len(), 4);
    assert_eq!(table.armed_count(), 4);
    for reservation in table.iter() {
        let mine = sandbox.agent(reservation.owner).unwrap();
        assert!(mine.is_burrowed);
        assert!(mine.position.distance(reservation.position) < 1e-9);
    }
}

#[test]
fn lone_enemy_inside_trigger_range_surfaces_the_mine() {
    let mut sandbox = Sandbox::skirmish(MicroConfig::default());
    baneling_pack(&mut sandbox, 4);
    sandbox.run_until(17);

    let armed: Vec<(UnitTag, Point)> = sandbox
        .controller
        .reservations()
        .iter()
        .map(|r| (r.owner, r.position))
        .collect();
    assert_eq!(armed.len(), 4);
    let (owner, slot) = armed[0];

    // 2.0 is inside the 3.5 trigger range and below the explode threshold of three targets.
    let scout = slot + Vec2::new(2.0, 0.0);
    sandbox.world.enemies.push(enemy(900, UnitClass::Marine, scout.x, scout.y));

    let outputs = sandbox.run_until(25);
    let trigger = outputs.iter().find(|o| o.report.tick == 24).unwrap();
    let issued = trigger.batch.command_for(owner).unwrap();
    assert_eq!(issued.command, Command::cast(AbilityId::BurrowUp));
    assert_eq!(issued.origin, CommandOrigin::Ability);

    let table = sandbox.controller.reservations();
    assert!(table.get(owner).is_none());
    for (other, position) in armed.iter().skip(1) {
        let kept = table.get(*other).unwrap();
        assert!(kept.armed);
        assert!(kept.position.distance(*position) < 1e-9);
    }
    assert!(!sandbox.agent(owner).unwrap().is_burrowed);
}

#[test]
fn spacing_holds_under_random_pressure() {
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    let mut sandbox = Sandbox::skirmish(MicroConfig::default());
    baneling_pack(&mut sandbox, 10);

    for window in 0_u64..8 {
        sandbox.world.enemies.clear();
        let slots: Vec<Point> =
            sandbox.controller.reservations().iter().map(|r| r.position).collect();
        for (n, slot) in slots.iter().enumerate() {
            if rng.random_bool(0.5) {
                let angle = rng.random_range(0.0..core::f64::consts::TAU);
                let distance = rng.random_range(0.5..6.0);
                let at = *slot + Vec2::from_angle(angle) * distance;
                let tag = 1000 + window * 10 + u64::try_from(n).unwrap();
                sandbox.world.enemies.push(enemy(tag, UnitClass::Zealot, at.x, at.y));
            }
        }

        let until = (window + 1) * 40;
        while sandbox.controller.clock().tick() < until {
            let out = sandbox.step();
            assert_spaced(sandbox.controller.reservations(), out.report.tick);
        }
    }
}
