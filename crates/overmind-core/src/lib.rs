//! Tick scheduler, command reconciliation, and run loop for the Overmind engine.
//!
//! This crate owns the per-tick cycle that drives every other layer:
//! Observe, Abilities, Movement, Reconcile, and Sweep, followed by the single
//! command dispatch.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter and stage cadences.
//! - [`config`] -- Configuration loading from `overmind-config.yaml` into
//!   strongly-typed structs.
//! - [`reconcile`] -- One command per agent per tick, ability first.
//! - [`runner`] -- Async run loop with tick bounds and a stop handle.
//! - [`scheduler`] -- [`MicroController`], the stage orchestration.
//! - [`sink`] -- [`CommandSink`] trait with channel and recording sinks.
//! - [`throttle`] -- Rate limiting for repeated per-agent failure logs.
//!
//! [`MicroController`]: scheduler::MicroController
//! [`CommandSink`]: sink::CommandSink

pub mod clock;
pub mod config;
pub mod reconcile;
pub mod runner;
pub mod scheduler;
pub mod sink;
pub mod throttle;

pub use clock::{Cadence, ClockError, TickClock};
pub use config::{ConfigError, LoggingConfig, MicroConfig, ScheduleConfig};
pub use reconcile::CommandReconciler;
pub use runner::{
    RunBounds, RunEndReason, RunSummary, RunnerError, StopHandle, log_run_end, run_controller,
};
pub use scheduler::{MicroController, SchedulerError, TickOutput, TickReport};
pub use sink::{ChannelSink, CommandSink, RecordingSink, SinkError};
pub use throttle::LogThrottle;
