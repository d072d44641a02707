//! Update scheduler: the per-tick orchestration of every stage.
//!
//! Each tick runs through these stages:
//!
//! 1. **Observe** -- build the [`WorldSnapshot`] from the provider's
//!    observation, refresh the chokepoint cache when due, record chokepoint
//!    threat, register tags in the tactical arena.
//!
//! 2. **Abilities** -- on the ability cadence, run the [`AbilityBank`]. Agents
//!    that received a command form the skip set.
//!
//! 3. **Movement** -- on the movement cadence, steer every agent not in the
//!    skip set, not burrowed, and not held by a tactical mode. Failures fall
//!    back to the spacing-only pass.
//!
//! 4. **Reconcile** -- one command per agent, ability first; seal the batch.
//!
//! 5. **Sweep** -- evict absent or stale reservations, prune tactical state
//!    and throttle keys for tags that disappeared.
//!
//! Stages 1-5 are synchronous ([`MicroController::step`]). The async
//! [`MicroController::run_tick`] wraps them with the provider call and the
//! single sink dispatch. A failed observation is not fatal: the caller hands
//! it to [`MicroController::skip_tick`] and the next tick observes afresh.

use std::collections::BTreeSet;

use overmind_steering::{ChokepointCache, SteeringEngine, SteeringError};
use overmind_tactics::{AbilityBank, ReservationTable, SweepReason, TacticalArena};
use overmind_types::{Agent, BatchId, Command, CommandBatch, CommandOrigin, Point, UnitTag};
use overmind_world::{Observation, SnapshotProvider, TerrainOracle, WorldError, WorldSnapshot};
use serde::Serialize;
use tracing::{debug, warn};

use crate::clock::{Cadence, ClockError, TickClock};
use crate::config::{ConfigError, MicroConfig};
use crate::reconcile::CommandReconciler;
use crate::sink::{CommandSink, SinkError};
use crate::throttle::LogThrottle;

/// Slack added to weapon range when deciding a target is within reach.
const CONTACT_MARGIN: f64 = 0.5;

/// Errors that abort a whole tick.
///
/// Per-agent problems never surface here; they are logged and the agent is
/// skipped.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The provider failed to produce an observation.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The sink refused the batch.
    #[error("sink error: {source}")]
    Sink {
        /// The underlying sink error.
        #[from]
        source: SinkError,
    },

    /// The tick clock cannot advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Counts describing one executed tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// The tick that ran.
    pub tick: u64,
    /// Id of the dispatched batch.
    pub batch_id: BatchId,
    /// Agents in the snapshot.
    pub agents: usize,
    /// Agent copies dropped because their tag was already reported.
    pub duplicates_dropped: usize,
    /// Whether the ability bank ran this tick.
    pub ability_pass: bool,
    /// Whether the movement stage ran this tick.
    pub movement_pass: bool,
    /// Commands from the ability bank.
    pub ability_commands: usize,
    /// Commands from the primary steering pipeline.
    pub movement_commands: usize,
    /// Commands from the spacing-only fallback.
    pub fallback_commands: usize,
    /// Agents skipped because of a per-agent failure.
    pub failures: usize,
    /// Reservations evicted by the sweep.
    pub swept_reservations: usize,
    /// Tactical states evicted for absent tags.
    pub pruned_states: usize,
}

/// The sealed batch and the report of one synchronous step.
#[derive(Debug, Clone)]
pub struct TickOutput {
    /// The commands to dispatch.
    pub batch: CommandBatch,
    /// What happened.
    pub report: TickReport,
}

/// Owns every piece of per-game state and runs the tick stages.
#[derive(Debug)]
pub struct MicroController {
    config: MicroConfig,
    clock: TickClock,
    movement: Cadence,
    abilities: Cadence,
    steering: SteeringEngine,
    bank: AbilityBank,
    chokepoints: ChokepointCache,
    next_refresh_attempt: u64,
    arena: TacticalArena,
    reservations: ReservationTable,
    throttle: LogThrottle,
}

impl MicroController {
    /// Build a controller at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `config` fails validation.
    pub fn new(config: MicroConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let schedule = &config.schedule;
        let steering = SteeringEngine::new(
            config.steering.clone(),
            config.potential.clone(),
            config.formation.clone(),
        );
        Ok(Self {
            clock: TickClock::new(schedule.ticks_per_second),
            movement: Cadence::every(schedule.update_interval),
            abilities: Cadence::every(schedule.burrow_check_interval),
            steering,
            bank: AbilityBank::new(config.tactics.clone(), schedule.ticks_per_second),
            chokepoints: ChokepointCache::new(&config.formation),
            next_refresh_attempt: 0,
            arena: TacticalArena::new(),
            reservations: ReservationTable::new(
                config.tactics.mine_spacing,
                config.tactics.max_active_mines,
            ),
            throttle: LogThrottle::new(config.logging.throttle_window_ticks),
            config,
        })
    }

    /// The configuration in use.
    pub const fn config(&self) -> &MicroConfig {
        &self.config
    }

    /// The tick clock.
    pub const fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// Per-agent tactical state.
    pub const fn arena(&self) -> &TacticalArena {
        &self.arena
    }

    /// Current mine reservations.
    pub const fn reservations(&self) -> &ReservationTable {
        &self.reservations
    }

    /// Cached chokepoints.
    pub const fn chokepoints(&self) -> &ChokepointCache {
        &self.chokepoints
    }

    /// The steering pipeline.
    pub const fn steering(&self) -> &SteeringEngine {
        &self.steering
    }

    /// Events swallowed by the failure log throttle so far.
    pub const fn suppressed_log_events(&self) -> u64 {
        self.throttle.suppressed_total()
    }

    /// Observe, decide, and dispatch one tick.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::World`] if the provider fails, leaving the
    /// clock untouched, [`SchedulerError::Sink`] if the sink refuses the
    /// batch, and [`SchedulerError::Clock`] if the clock overflows.
    pub async fn run_tick<S>(
        &mut self,
        provider: &mut dyn SnapshotProvider,
        terrain: &dyn TerrainOracle,
        sink: &mut S,
    ) -> Result<TickReport, SchedulerError>
    where
        S: CommandSink,
    {
        let observation = provider.observe(self.clock.tick())?;
        let TickOutput { batch, report } = self.step(observation, terrain)?;
        sink.dispatch(batch).await?;
        Ok(report)
    }

    /// Give up on the current tick after its observation failed.
    ///
    /// Nothing is dispatched; the failure goes through the log throttle and
    /// the clock moves on so cadences stay aligned with game time.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Clock`] if the tick counter would overflow.
    pub fn skip_tick(&mut self, error: &WorldError) -> Result<(), SchedulerError> {
        let tick = self.clock.tick();
        if let Some(suppressed) = self.throttle.admit_tick_event("observation", tick) {
            warn!(tick, suppressed, error = %error, "observation failed, tick skipped");
        }
        self.clock.advance()?;
        Ok(())
    }

    /// Run stages 1-5 for the current tick and advance the clock.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Clock`] if the tick counter would overflow.
    pub fn step(
        &mut self,
        observation: Observation,
        terrain: &dyn TerrainOracle,
    ) -> Result<TickOutput, SchedulerError> {
        let tick = self.clock.tick();

        // --- Stage 1: observe ---
        let snapshot = WorldSnapshot::build(tick, observation, terrain);
        for tag in snapshot.duplicate_tags() {
            if let Some(suppressed) = self.throttle.admit(*tag, "duplicate_tag", tick) {
                warn!(tick, tag = %tag, suppressed, "duplicate agent tag, later copy dropped");
            }
        }
        self.refresh_chokepoints(tick, terrain);
        let enemy_positions: Vec<Point> = snapshot.hostile_units().map(|e| e.position).collect();
        self.chokepoints.record_threat(&enemy_positions);
        self.arena.observe(snapshot.agent_tags(), tick);

        let mut reconciler = CommandReconciler::new();
        let mut failures: usize = 0;

        // --- Stage 2: abilities ---
        let ability_pass = self.abilities.is_due(tick);
        let mut skip: BTreeSet<UnitTag> = BTreeSet::new();
        if ability_pass {
            let outcome = self.bank.run(
                &snapshot,
                terrain,
                &self.chokepoints,
                &mut self.arena,
                &mut self.reservations,
            );
            for failure in &outcome.failures {
                failures = failures.saturating_add(1);
                log_agent_failure(&mut self.throttle, tick, failure.tag(), failure.kind(), failure);
            }
            for (tag, command) in outcome.commands {
                reconciler.propose(tag, command, CommandOrigin::Ability);
            }
            skip = outcome.acted;
        }

        // --- Stage 3: movement ---
        let movement_pass = self.movement.is_due(tick);
        if movement_pass {
            for agent in snapshot.agents() {
                if skip.contains(&agent.tag) || agent.is_burrowed || self.arena.is_held(agent.tag) {
                    continue;
                }
                match self.movement_command(agent, &snapshot, terrain) {
                    Ok(Some((command, origin))) => {
                        reconciler.propose(agent.tag, command, origin);
                    }
                    Ok(None) => {}
                    Err(error) => {
                        failures = failures.saturating_add(1);
                        let kind = error.kind();
                        log_agent_failure(&mut self.throttle, tick, agent.tag, kind, &error);
                    }
                }
            }
        }

        // --- Stage 4: reconcile ---
        let ability_commands = reconciler.count(CommandOrigin::Ability);
        let movement_commands = reconciler.count(CommandOrigin::Movement);
        let fallback_commands = reconciler.count(CommandOrigin::Fallback);
        let batch = reconciler.finish(tick);

        // --- Stage 5: sweep ---
        let present = snapshot.agent_tags();
        let swept = self.reservations.sweep(
            &present,
            tick,
            self.config.tactics.reservation_timeout_ticks,
        );
        for (reservation, reason) in &swept {
            if *reason == SweepReason::Stale {
                self.arena.entry(reservation.owner, tick).reset_mine();
            }
            debug!(tick, owner = %reservation.owner, ?reason, "reservation swept");
        }
        let pruned = self.arena.prune(&present);
        self.throttle.prune(&present);

        let report = TickReport {
            tick,
            batch_id: batch.id,
            agents: snapshot.agent_count(),
            duplicates_dropped: snapshot.duplicate_tags().len(),
            ability_pass,
            movement_pass,
            ability_commands,
            movement_commands,
            fallback_commands,
            failures,
            swept_reservations: swept.len(),
            pruned_states: pruned.len(),
        };
        debug!(
            tick,
            agents = report.agents,
            ability = report.ability_commands,
            movement = report.movement_commands,
            fallback = report.fallback_commands,
            failures = report.failures,
            "tick complete"
        );

        self.clock.advance()?;
        Ok(TickOutput { batch, report })
    }

    /// Refresh the chokepoint cache when due. A failed refresh keeps the old
    /// cache and is retried one interval later.
    fn refresh_chokepoints(&mut self, tick: u64, terrain: &dyn TerrainOracle) {
        let interval = self.config.schedule.chokepoint_refresh_interval;
        if tick < self.next_refresh_attempt || !self.chokepoints.is_refresh_due(tick, interval) {
            return;
        }
        if let Err(error) = self.chokepoints.refresh(tick, terrain) {
            self.next_refresh_attempt = tick.saturating_add(interval);
            warn!(
                tick,
                %error,
                kept = self.chokepoints.chokepoints().len(),
                "chokepoint refresh failed, keeping cached chokepoints"
            );
        }
    }

    /// The movement-stage command for one agent.
    ///
    /// `Ok(None)` means the agent has nothing to do this tick.
    fn movement_command(
        &self,
        agent: &Agent,
        snapshot: &WorldSnapshot,
        terrain: &dyn TerrainOracle,
    ) -> Result<Option<(Command, CommandOrigin)>, SteeringError> {
        let foe = snapshot.nearest_enemy(agent.position, |e| agent.class.can_target(e.domain));
        let in_reach = foe.filter(|(_, d)| {
            agent.class.has_weapon() && *d <= agent.class.attack_range() + CONTACT_MARGIN
        });
        let seek = snapshot.objective().or_else(|| foe.map(|(e, _)| e.position));

        match self.steering.plan(agent, snapshot, terrain, &self.chokepoints, seek) {
            Ok(plan) => {
                if let Some((enemy, _)) = in_reach
                    && agent.weapon_ready()
                {
                    return Ok(Some((Command::AttackTarget(enemy.tag), CommandOrigin::Movement)));
                }
                Ok(Some((Command::MoveTo(plan.target), CommandOrigin::Movement)))
            }
            Err(primary) => {
                debug!(
                    tag = %agent.tag,
                    error = %primary,
                    "steering failed, using spacing fallback"
                );
                if let Some((enemy, _)) = in_reach
                    && agent.weapon_ready()
                {
                    return Ok(Some((Command::AttackTarget(enemy.tag), CommandOrigin::Fallback)));
                }
                let target = self.steering.spacing_only(agent, snapshot)?;
                if target.distance(agent.position) < f64::EPSILON {
                    return Ok(None);
                }
                Ok(Some((Command::MoveTo(target), CommandOrigin::Fallback)))
            }
        }
    }
}

fn log_agent_failure(
    throttle: &mut LogThrottle,
    tick: u64,
    tag: UnitTag,
    kind: &'static str,
    error: &dyn core::fmt::Display,
) {
    if let Some(suppressed) = throttle.admit(tag, kind, tick) {
        warn!(tick, tag = %tag, kind, suppressed, error = %error, "agent skipped this tick");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use overmind_types::{AbilityId, Enemy, UnitClass};
    use overmind_world::{GridTerrain, ScriptedProvider};

    use super::*;
    use crate::sink::RecordingSink;

    fn unit(tag: u64, class: UnitClass, x: f64, y: f64) -> Agent {
        Agent::new(UnitTag::new(tag), class, Point::new(x, y))
    }

    fn foe(tag: u64, class: UnitClass, x: f64, y: f64) -> Enemy {
        Enemy::new(UnitTag::new(tag), class, Point::new(x, y))
    }

    fn controller() -> MicroController {
        MicroController::new(MicroConfig::default()).unwrap()
    }

    #[test]
    fn in_range_ready_agent_attacks() {
        let mut ctl = controller();
        let terrain = GridTerrain::new(64, 64).unwrap();
        let observation = Observation {
            agents: vec![unit(1, UnitClass::Roach, 20.0, 20.0)],
            enemies: vec![foe(50, UnitClass::Marine, 23.0, 20.0)],
            ..Observation::default()
        };
        let out = ctl.step(observation, &terrain).unwrap();
        let issued = out.batch.command_for(UnitTag::new(1)).unwrap();
        assert_eq!(issued.command, Command::AttackTarget(UnitTag::new(50)));
        assert_eq!(issued.origin, CommandOrigin::Movement);
    }

    #[test]
    fn cooling_down_agent_moves_instead() {
        let mut ctl = controller();
        let terrain = GridTerrain::new(64, 64).unwrap();
        let mut roach = unit(1, UnitClass::Roach, 20.0, 20.0);
        roach.weapon_cooldown = 0.5;
        let observation = Observation {
            agents: vec![roach],
            enemies: vec![foe(50, UnitClass::Marine, 23.0, 20.0)],
            ..Observation::default()
        };
        let out = ctl.step(observation, &terrain).unwrap();
        let issued = out.batch.command_for(UnitTag::new(1)).unwrap();
        assert!(matches!(issued.command, Command::MoveTo(_)));
    }

    #[test]
    fn untraversable_target_falls_back_to_spacing() {
        let mut ctl = controller();
        let mut terrain = GridTerrain::new(64, 64).unwrap();
        terrain.block_rect(20, 0, 63, 63);
        let observation = Observation {
            agents: vec![
                unit(1, UnitClass::Zergling, 40.0, 20.0),
                unit(2, UnitClass::Zergling, 39.3, 20.0),
            ],
            objective: Some(Point::new(50.0, 20.0)),
            ..Observation::default()
        };
        let out = ctl.step(observation, &terrain).unwrap();
        assert_eq!(out.report.fallback_commands, 2);
        let issued = out.batch.command_for(UnitTag::new(1)).unwrap();
        assert_eq!(issued.origin, CommandOrigin::Fallback);
    }

    #[test]
    fn movement_respects_cadence() {
        let mut ctl = controller();
        let terrain = GridTerrain::new(64, 64).unwrap();
        let observation = Observation {
            agents: vec![unit(1, UnitClass::Zergling, 20.0, 20.0)],
            objective: Some(Point::new(40.0, 40.0)),
            ..Observation::default()
        };
        let first = ctl.step(observation.clone(), &terrain).unwrap();
        let second = ctl.step(observation, &terrain).unwrap();
        assert!(first.report.movement_pass);
        assert_eq!(first.batch.len(), 1);
        assert!(!second.report.movement_pass);
        assert!(second.batch.is_empty());
        assert_eq!(ctl.clock().tick(), 2);
    }

    #[test]
    fn ability_command_preempts_movement() {
        let mut ctl = controller();
        let terrain = GridTerrain::new(64, 64).unwrap();
        let mut roach = unit(1, UnitClass::Roach, 20.0, 20.0);
        roach.health_ratio = 0.1;
        let observation = Observation {
            agents: vec![roach],
            enemies: vec![foe(50, UnitClass::Marine, 24.0, 20.0)],
            ..Observation::default()
        };
        let out = ctl.step(observation, &terrain).unwrap();
        assert_eq!(out.batch.len(), 1);
        let issued = out.batch.command_for(UnitTag::new(1)).unwrap();
        assert_eq!(issued.command, Command::cast(AbilityId::BurrowDown));
        assert_eq!(issued.origin, CommandOrigin::Ability);
    }

    #[test]
    fn departed_agents_are_pruned() {
        let mut ctl = controller();
        let terrain = GridTerrain::new(64, 64).unwrap();
        let both = Observation {
            agents: vec![
                unit(1, UnitClass::Zergling, 10.0, 10.0),
                unit(2, UnitClass::Zergling, 12.0, 10.0),
            ],
            ..Observation::default()
        };
        ctl.step(both, &terrain).unwrap();
        assert_eq!(ctl.arena().len(), 2);
        let one = Observation {
            agents: vec![unit(2, UnitClass::Zergling, 12.0, 10.0)],
            ..Observation::default()
        };
        let out = ctl.step(one, &terrain).unwrap();
        assert_eq!(out.report.pruned_states, 1);
        assert!(ctl.arena().get(UnitTag::new(1)).is_none());
    }

    #[test]
    fn terrain_outage_keeps_previous_chokepoints() {
        let mut ctl = controller();
        let mut terrain = GridTerrain::new(64, 64)
            .unwrap()
            .with_chokepoints(vec![Point::new(30.0, 30.0)]);
        ctl.step(Observation::default(), &terrain).unwrap();
        assert_eq!(ctl.chokepoints().chokepoints().len(), 1);

        terrain.set_available(false);
        for _ in 0..150 {
            ctl.step(Observation::default(), &terrain).unwrap();
        }
        assert_eq!(ctl.chokepoints().chokepoints().len(), 1);
        assert_eq!(ctl.chokepoints().last_refresh(), Some(0));
    }

    #[test]
    fn duplicate_tags_keep_the_first_copy() {
        let mut ctl = controller();
        let terrain = GridTerrain::new(64, 64).unwrap();
        let observation = Observation {
            agents: vec![
                unit(1, UnitClass::Zergling, 10.0, 10.0),
                unit(2, UnitClass::Zergling, 14.0, 10.0),
                unit(1, UnitClass::Zergling, 11.0, 10.0),
            ],
            objective: Some(Point::new(40.0, 10.0)),
            ..Observation::default()
        };
        let out = ctl.step(observation, &terrain).unwrap();
        assert_eq!(out.report.agents, 2);
        assert_eq!(out.report.duplicates_dropped, 1);
        assert_eq!(out.batch.len(), 2);
        assert_eq!(ctl.clock().tick(), 1);
    }

    #[test]
    fn skipped_tick_advances_the_clock() {
        let mut ctl = controller();
        let error = WorldError::ProviderFailed {
            reason: String::from("feed lost"),
        };
        ctl.skip_tick(&error).unwrap();
        ctl.skip_tick(&error).unwrap();
        assert_eq!(ctl.clock().tick(), 2);
        assert_eq!(ctl.suppressed_log_events(), 1);
    }

    #[test]
    fn fallback_holds_fire_while_reloading() {
        let mut ctl = controller();
        let mut terrain = GridTerrain::new(64, 64).unwrap();
        terrain.block_rect(20, 0, 63, 63);
        let mut ling = unit(1, UnitClass::Zergling, 40.0, 20.0);
        ling.weapon_cooldown = 0.4;
        let observation = Observation {
            agents: vec![ling, unit(2, UnitClass::Roach, 39.3, 20.0)],
            enemies: vec![foe(50, UnitClass::Marine, 40.5, 20.0)],
            objective: Some(Point::new(50.0, 20.0)),
            ..Observation::default()
        };
        let out = ctl.step(observation, &terrain).unwrap();
        let reloading = out.batch.command_for(UnitTag::new(1)).unwrap();
        assert_eq!(reloading.origin, CommandOrigin::Fallback);
        assert!(matches!(reloading.command, Command::MoveTo(_)));
        let ready = out.batch.command_for(UnitTag::new(2)).unwrap();
        assert_eq!(ready.command, Command::AttackTarget(UnitTag::new(50)));
        assert_eq!(ready.origin, CommandOrigin::Fallback);
    }

    #[tokio::test]
    async fn run_tick_dispatches_one_batch() {
        let mut ctl = controller();
        let terrain = GridTerrain::new(64, 64).unwrap();
        let mut provider = ScriptedProvider::constant(Observation {
            agents: vec![unit(1, UnitClass::Zergling, 10.0, 10.0)],
            objective: Some(Point::new(30.0, 30.0)),
            ..Observation::default()
        });
        let mut sink = RecordingSink::new();
        for _ in 0..3 {
            ctl.run_tick(&mut provider, &terrain, &mut sink).await.unwrap();
        }
        assert_eq!(sink.batches().len(), 3);
        let ticks: Vec<u64> = sink.batches().iter().map(|b| b.tick).collect();
        assert_eq!(ticks, vec![0, 1, 2]);
    }
}
