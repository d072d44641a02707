//! Shared type definitions for the Overmind micro-control engine.
//!
//! This crate is the single source of truth for the data that flows between
//! the world snapshot, the steering and tactics layers, and the scheduler.
//!
//! # Modules
//!
//! - [`ids`] -- Unit tags and command batch identifiers
//! - [`geometry`] -- [`Vec2`] positions and forces
//! - [`enums`] -- Unit classes, movement domains, ability ids
//! - [`structs`] -- Agents, enemies, chokepoints
//! - [`commands`] -- Commands and command batches for the sink

pub mod commands;
pub mod enums;
pub mod geometry;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use commands::{AbilityTarget, Command, CommandBatch, CommandOrigin, IssuedCommand};
pub use enums::{AbilityId, Domain, UnitClass};
pub use geometry::{Point, Vec2};
pub use ids::{BatchId, UnitTag};
pub use structs::{Agent, Chokepoint, Enemy};
