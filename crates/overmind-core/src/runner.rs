//! Async run loop around the scheduler.
//!
//! [`run_controller`] drives [`MicroController::run_tick`] at a fixed real
//! time interval until a tick limit is reached or a stop is requested through
//! a [`StopHandle`]. The inter-tick sleep and the sink dispatch are the only
//! suspension points. A tick whose observation fails is skipped and counted;
//! only a closed sink or clock overflow ends the run with an error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use overmind_world::{SnapshotProvider, TerrainOracle};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ScheduleConfig;
use crate::scheduler::{MicroController, SchedulerError, TickReport};
use crate::sink::CommandSink;

/// Errors that can occur during the run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick failed unrecoverably.
    #[error("tick {tick} failed: {source}")]
    Tick {
        /// The tick that failed.
        tick: u64,
        /// The underlying scheduler error.
        source: SchedulerError,
    },
}

/// Limits for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBounds {
    /// Stop after this many ticks (0 = unlimited).
    pub max_ticks: u64,
    /// Real-time milliseconds to sleep between ticks (0 = no sleep).
    pub tick_interval_ms: u64,
}

impl RunBounds {
    /// Bounds taken from the schedule section.
    pub const fn from_schedule(schedule: &ScheduleConfig) -> Self {
        Self {
            max_ticks: schedule.max_ticks,
            tick_interval_ms: schedule.tick_interval_ms,
        }
    }

    const fn limit_reached(&self, ticks: u64) -> bool {
        self.max_ticks > 0 && ticks >= self.max_ticks
    }
}

/// Shared stop flag for a running loop.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    /// A handle with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop before its next tick.
    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

/// Why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunEndReason {
    /// `max_ticks` ticks were executed.
    MaxTicksReached,
    /// A stop was requested through the [`StopHandle`].
    StopRequested,
}

/// Totals for a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Why the loop stopped.
    pub end_reason: RunEndReason,
    /// Ticks executed.
    pub ticks_run: u64,
    /// Ticks skipped because the observation failed.
    pub ticks_skipped: u64,
    /// Commands dispatched across all batches.
    pub commands_dispatched: u64,
    /// Fallback commands among them.
    pub fallback_commands: u64,
    /// Per-agent failures across the run.
    pub failures: u64,
    /// Report of the last tick, if any ran.
    pub last_report: Option<TickReport>,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            end_reason: RunEndReason::StopRequested,
            ticks_run: 0,
            ticks_skipped: 0,
            commands_dispatched: 0,
            fallback_commands: 0,
            failures: 0,
            last_report: None,
        }
    }

    fn absorb(&mut self, report: TickReport) {
        let commands = report
            .ability_commands
            .saturating_add(report.movement_commands)
            .saturating_add(report.fallback_commands);
        self.ticks_run = self.ticks_run.saturating_add(1);
        self.commands_dispatched = self.commands_dispatched.saturating_add(widen(commands));
        self.fallback_commands =
            self.fallback_commands.saturating_add(widen(report.fallback_commands));
        self.failures = self.failures.saturating_add(widen(report.failures));
        self.last_report = Some(report);
    }

    /// Ticks executed or skipped; the tick limit counts both.
    const fn ticks_elapsed(&self) -> u64 {
        self.ticks_run.saturating_add(self.ticks_skipped)
    }
}

fn widen(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

/// Run the controller until a bound is hit or a stop is requested.
///
/// # Errors
///
/// Returns [`RunnerError::Tick`] if the sink refuses a batch or the clock
/// overflows.
pub async fn run_controller<S>(
    controller: &mut MicroController,
    provider: &mut dyn SnapshotProvider,
    terrain: &dyn TerrainOracle,
    sink: &mut S,
    bounds: RunBounds,
    stop: &StopHandle,
) -> Result<RunSummary, RunnerError>
where
    S: CommandSink,
{
    let mut summary = RunSummary::new();
    info!(
        max_ticks = bounds.max_ticks,
        tick_interval_ms = bounds.tick_interval_ms,
        start_tick = controller.clock().tick(),
        "Controller starting"
    );

    loop {
        if stop.is_stop_requested() {
            info!(ticks_run = summary.ticks_run, "Stop requested");
            summary.end_reason = RunEndReason::StopRequested;
            return Ok(summary);
        }

        let tick = controller.clock().tick();
        match controller.run_tick(provider, terrain, sink).await {
            Ok(report) => summary.absorb(report),
            Err(SchedulerError::World { source }) => {
                controller
                    .skip_tick(&source)
                    .map_err(|source| RunnerError::Tick { tick, source })?;
                summary.ticks_skipped = summary.ticks_skipped.saturating_add(1);
            }
            Err(source) => return Err(RunnerError::Tick { tick, source }),
        }

        if bounds.limit_reached(summary.ticks_elapsed()) {
            info!(
                ticks_run = summary.ticks_run,
                ticks_skipped = summary.ticks_skipped,
                "Tick limit reached"
            );
            summary.end_reason = RunEndReason::MaxTicksReached;
            return Ok(summary);
        }

        if bounds.tick_interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(bounds.tick_interval_ms)).await;
        }
    }
}

/// Log the end of a run.
pub fn log_run_end(summary: &RunSummary, suppressed_log_events: u64) {
    info!(
        reason = ?summary.end_reason,
        ticks_run = summary.ticks_run,
        ticks_skipped = summary.ticks_skipped,
        commands = summary.commands_dispatched,
        fallbacks = summary.fallback_commands,
        failures = summary.failures,
        suppressed_log_events,
        "Controller stopped"
    );
    if summary.last_report.is_none() {
        warn!("Controller stopped with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use overmind_types::{Agent, Point, UnitClass, UnitTag};
    use overmind_world::{GridTerrain, Observation, ScriptedProvider, WorldError};

    use super::*;
    use crate::config::MicroConfig;
    use crate::sink::{ChannelSink, RecordingSink};

    fn observation() -> Observation {
        Observation {
            agents: vec![Agent::new(UnitTag::new(1), UnitClass::Zergling, Point::new(10.0, 10.0))],
            objective: Some(Point::new(30.0, 30.0)),
            ..Observation::default()
        }
    }

    fn bounds(max_ticks: u64) -> RunBounds {
        RunBounds {
            max_ticks,
            tick_interval_ms: 0,
        }
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut controller = MicroController::new(MicroConfig::default()).unwrap();
        let terrain = GridTerrain::new(64, 64).unwrap();
        let mut provider = ScriptedProvider::constant(observation());
        let mut sink = RecordingSink::new();

        let summary = run_controller(
            &mut controller,
            &mut provider,
            &terrain,
            &mut sink,
            bounds(5),
            &StopHandle::new(),
        )
        .await
        .unwrap();

        assert_eq!(summary.end_reason, RunEndReason::MaxTicksReached);
        assert_eq!(summary.ticks_run, 5);
        assert_eq!(sink.batches().len(), 5);
        assert_eq!(controller.clock().tick(), 5);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json.pointer("/end_reason").and_then(|v| v.as_str()), Some("MaxTicksReached"));
        assert_eq!(json.pointer("/last_report/tick").and_then(serde_json::Value::as_u64), Some(4));
    }

    #[tokio::test]
    async fn stop_before_first_tick() {
        let mut controller = MicroController::new(MicroConfig::default()).unwrap();
        let terrain = GridTerrain::new(64, 64).unwrap();
        let mut provider = ScriptedProvider::constant(observation());
        let mut sink = RecordingSink::new();
        let stop = StopHandle::new();
        stop.request_stop();

        let summary =
            run_controller(&mut controller, &mut provider, &terrain, &mut sink, bounds(0), &stop)
                .await
                .unwrap();

        assert_eq!(summary.end_reason, RunEndReason::StopRequested);
        assert_eq!(summary.ticks_run, 0);
        assert!(summary.last_report.is_none());
    }

    /// Fails on the listed ticks and replays a fixed observation otherwise.
    struct Flaky {
        failing: Vec<u64>,
        inner: ScriptedProvider,
    }

    impl SnapshotProvider for Flaky {
        fn observe(&mut self, tick: u64) -> Result<Observation, WorldError> {
            if self.failing.contains(&tick) {
                return Err(WorldError::ProviderFailed {
                    reason: String::from("feed lost"),
                });
            }
            self.inner.observe(tick)
        }
    }

    #[tokio::test]
    async fn failed_observation_skips_one_tick() {
        let mut controller = MicroController::new(MicroConfig::default()).unwrap();
        let terrain = GridTerrain::new(64, 64).unwrap();
        let mut provider = Flaky {
            failing: vec![1],
            inner: ScriptedProvider::constant(observation()),
        };
        let mut sink = RecordingSink::new();

        let summary = run_controller(
            &mut controller,
            &mut provider,
            &terrain,
            &mut sink,
            bounds(5),
            &StopHandle::new(),
        )
        .await
        .unwrap();

        assert_eq!(summary.end_reason, RunEndReason::MaxTicksReached);
        assert_eq!(summary.ticks_run, 4);
        assert_eq!(summary.ticks_skipped, 1);
        let ticks: Vec<u64> = sink.batches().iter().map(|b| b.tick).collect();
        assert_eq!(ticks, vec![0, 2, 3, 4]);
        assert_eq!(controller.clock().tick(), 5);
    }

    #[tokio::test]
    async fn provider_outage_never_ends_the_run() {
        let mut controller = MicroController::new(MicroConfig::default()).unwrap();
        let terrain = GridTerrain::new(64, 64).unwrap();
        let mut provider = Flaky {
            failing: (0..3).collect(),
            inner: ScriptedProvider::constant(observation()),
        };
        let mut sink = RecordingSink::new();

        let summary = run_controller(
            &mut controller,
            &mut provider,
            &terrain,
            &mut sink,
            bounds(3),
            &StopHandle::new(),
        )
        .await
        .unwrap();

        assert_eq!(summary.ticks_run, 0);
        assert_eq!(summary.ticks_skipped, 3);
        assert!(summary.last_report.is_none());
        assert!(sink.batches().is_empty());
    }

    #[tokio::test]
    async fn closed_sink_ends_the_run() {
        let mut controller = MicroController::new(MicroConfig::default()).unwrap();
        let terrain = GridTerrain::new(64, 64).unwrap();
        let mut provider = ScriptedProvider::constant(observation());
        let (mut sink, rx) = ChannelSink::channel(4);
        drop(rx);

        let err = run_controller(
            &mut controller,
            &mut provider,
            &terrain,
            &mut sink,
            bounds(3),
            &StopHandle::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            RunnerError::Tick {
                tick: 0,
                source: SchedulerError::Sink { .. }
            }
        ));
    }

    #[tokio::test]
    async fn channel_sink_feeds_a_consumer() {
        let mut controller = MicroController::new(MicroConfig::default()).unwrap();
        let terrain = GridTerrain::new(64, 64).unwrap();
        let mut provider = ScriptedProvider::constant(observation());
        let (mut sink, mut rx) = ChannelSink::channel(16);

        let summary = run_controller(
            &mut controller,
            &mut provider,
            &terrain,
            &mut sink,
            bounds(4),
            &StopHandle::new(),
        )
        .await
        .unwrap();
        drop(sink);

        let mut received = 0_u64;
        while let Some(batch) = rx.recv().await {
            assert!(batch.commands.len() <= 1);
            received = received.saturating_add(1);
        }
        assert_eq!(received, summary.ticks_run);
    }
}
