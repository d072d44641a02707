//! Snapshot provider trait and a scripted implementation.
//!
//! The intel and production subsystems that know what is on the map live
//! outside the engine. Once per tick the scheduler asks a
//! [`SnapshotProvider`] for the raw [`Observation`] and builds a fresh
//! [`WorldSnapshot`] from it.
//!
//! [`ScriptedProvider`] replays a fixed sequence of observations, which is
//! enough to drive the scheduler end-to-end in tests.
//!
//! [`WorldSnapshot`]: crate::snapshot::WorldSnapshot

use std::collections::VecDeque;

use crate::error::WorldError;
use crate::snapshot::Observation;

/// A source of per-tick world observations.
pub trait SnapshotProvider {
    /// Observe the world for the given tick.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ProviderFailed`] if no observation could be
    /// produced. The run loop skips the tick and observes again on the next
    /// one.
    fn observe(&mut self, tick: u64) -> Result<Observation, WorldError>;
}

/// Replays queued observations in order, then repeats the last one forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    queue: VecDeque<Observation>,
    last: Option<Observation>,
}

impl ScriptedProvider {
    /// Create a provider that replays `observations` in order.
    pub fn new(observations: impl IntoIterator<Item = Observation>) -> Self {
        Self {
            queue: observations.into_iter().collect(),
            last: None,
        }
    }

    /// Create a provider that returns the same observation every tick.
    pub fn constant(observation: Observation) -> Self {
        Self::new([observation])
    }

    /// Append an observation to the end of the script.
    pub fn push(&mut self, observation: Observation) {
        self.queue.push_back(observation);
    }
}

impl SnapshotProvider for ScriptedProvider {
    fn observe(&mut self, tick: u64) -> Result<Observation, WorldError> {
        if let Some(next) = self.queue.pop_front() {
            self.last = Some(next.clone());
            return Ok(next);
        }
        self.last.clone().ok_or_else(|| WorldError::ProviderFailed {
            reason: format!("script exhausted before tick {tick}"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use overmind_types::Point;

    use super::*;

    fn with_objective(x: f64) -> Observation {
        Observation {
            objective: Some(Point::new(x, 0.0)),
            ..Observation::default()
        }
    }

    #[test]
    fn empty_script_fails() {
        let mut provider = ScriptedProvider::default();
        assert!(matches!(
            provider.observe(0),
            Err(WorldError::ProviderFailed { .. })
        ));
    }

    #[test]
    fn replays_in_order_then_repeats_last() {
        let mut provider = ScriptedProvider::new([with_objective(1.0), with_objective(2.0)]);
        assert_eq!(provider.observe(0).unwrap().objective, Some(Point::new(1.0, 0.0)));
        assert_eq!(provider.observe(1).unwrap().objective, Some(Point::new(2.0, 0.0)));
        assert_eq!(provider.observe(2).unwrap().objective, Some(Point::new(2.0, 0.0)));
    }
}
