//! World snapshot, terrain oracle, and snapshot provider for the Overmind engine.
//!
//! This crate owns the read side of the engine: everything the steering and
//! tactics layers know about the map and the units on it comes from a
//! [`WorldSnapshot`] built here once per tick.
//!
//! # Modules
//!
//! - [`error`] -- Error types for observation and terrain queries.
//! - [`provider`] -- [`SnapshotProvider`] trait and a scripted replay provider.
//! - [`snapshot`] -- [`WorldSnapshot`], [`Observation`], and [`Neighborhood`]
//!   queries.
//! - [`terrain`] -- [`TerrainOracle`] trait and the grid-backed [`GridTerrain`].
//! - [`skirmish`] -- Default two-base skirmish map.

pub mod error;
pub mod provider;
pub mod skirmish;
pub mod snapshot;
pub mod terrain;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use provider::{ScriptedProvider, SnapshotProvider};
pub use skirmish::{SKIRMISH_MAP_SIZE, SkirmishMap, create_skirmish_map};
pub use snapshot::{Neighborhood, Observation, WorldSnapshot};
pub use terrain::{GridTerrain, TerrainOracle};
