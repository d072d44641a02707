//! Error types for the `overmind-steering` crate.

use overmind_types::{Point, UnitTag};

/// Failures of the primary steering computation for one agent.
///
/// Degenerate geometry never surfaces here; it yields zero contributions.
/// These errors mean the result itself is unusable and the caller should
/// fall back to the spacing-only pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SteeringError {
    /// A position or force became NaN or infinite.
    #[error("non-finite {stage} for agent {tag}")]
    NonFinite {
        /// The agent being steered.
        tag: UnitTag,
        /// Which quantity went non-finite.
        stage: &'static str,
    },

    /// The computed ground target lies on blocked terrain.
    #[error("agent {tag} target {target} is not traversable")]
    Untraversable {
        /// The agent being steered.
        tag: UnitTag,
        /// The rejected target.
        target: Point,
    },
}

impl SteeringError {
    /// Short, stable name of the variant, used as a log-throttle key.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NonFinite { .. } => "non_finite",
            Self::Untraversable { .. } => "untraversable",
        }
    }

    /// The agent whose steering failed.
    pub const fn tag(&self) -> UnitTag {
        match self {
            Self::NonFinite { tag, .. } | Self::Untraversable { tag, .. } => *tag,
        }
    }
}
