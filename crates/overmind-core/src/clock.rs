//! Tick clock and stage cadences.
//!
//! The tick counter is the single source of truth for time inside the
//! engine. Seconds are derived from it through `ticks_per_second`, never
//! measured from the wall clock, so a replayed run makes the same decisions.

use serde::{Deserialize, Serialize};

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Simulation tick counter.
#[derive(Debug, Clone, PartialEq)]
pub struct TickClock {
    tick: u64,
    ticks_per_second: f64,
}

impl TickClock {
    /// A clock at tick 0.
    pub const fn new(ticks_per_second: f64) -> Self {
        Self {
            tick: 0,
            ticks_per_second,
        }
    }

    /// A clock resumed at `tick`.
    pub const fn starting_at(tick: u64, ticks_per_second: f64) -> Self {
        Self {
            tick,
            ticks_per_second,
        }
    }

    /// The current tick.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Configured simulation rate.
    pub const fn ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }

    /// Move to the next tick and return it.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] at `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Convert a tick span into simulated seconds.
    pub fn ticks_to_seconds(&self, ticks: u64) -> f64 {
        if self.ticks_per_second <= 0.0 {
            return 0.0;
        }
        u32::try_from(ticks).map_or(f64::from(u32::MAX), f64::from) / self.ticks_per_second
    }

    /// Simulated seconds elapsed since tick 0.
    pub fn elapsed_seconds(&self) -> f64 {
        self.ticks_to_seconds(self.tick)
    }
}

/// A stage that runs every `interval` ticks, shifted by `offset`.
///
/// Offsets let two stages with the same interval land on different ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cadence {
    /// Ticks between runs (0 behaves as 1).
    pub interval: u64,
    /// Phase shift in ticks.
    pub offset: u64,
}

impl Cadence {
    /// Every `interval` ticks starting at tick 0.
    pub const fn every(interval: u64) -> Self {
        Self { interval, offset: 0 }
    }

    /// Shift the cadence by `offset` ticks.
    #[must_use]
    pub const fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Whether the stage runs on `tick`.
    pub const fn is_due(&self, tick: u64) -> bool {
        let interval = if self.interval == 0 { 1 } else { self.interval };
        tick >= self.offset && (tick - self.offset) % interval == 0
    }
}
