//! Continuous movement forces for the Overmind engine.
//!
//! Every function here is pure and synchronous: given a read-only
//! [`WorldSnapshot`](overmind_world::WorldSnapshot) it proposes a target
//! position for one agent and never mutates anything shared between agents.
//!
//! # Modules
//!
//! - [`boids`] -- Spatial Force Aggregator (separation, alignment, cohesion,
//!   seek, avoid, encircle).
//! - [`config`] -- Tunable constants for all three components.
//! - [`error`] -- [`SteeringError`] for unusable results.
//! - [`formation`] -- Concave anchors and the [`ChokepointCache`].
//! - [`pipeline`] -- [`SteeringEngine`], the full per-agent computation.
//! - [`potential`] -- Potential Field Repulsion with splash escalation.

pub mod boids;
pub mod config;
pub mod error;
pub mod formation;
pub mod pipeline;
pub mod potential;

pub use boids::{ForceBreakdown, ForceInput, SpatialForceAggregator};
pub use config::{FormationConfig, PotentialConfig, SteeringConfig};
pub use error::SteeringError;
pub use formation::{ChokepointCache, FormationController, MIN_ARC_RADIUS};
pub use pipeline::{SteeringEngine, SteeringPlan};
pub use potential::{PotentialBreakdown, PotentialField, PotentialInput};
