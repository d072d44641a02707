//! Default skirmish map for the headless host and integration tests.
//!
//! A 96x96 grid with two walled main bases in opposite corners, each with a
//! four-cell ramp that forms a chokepoint, natural expansions just outside
//! the ramps, and a block of rocks in the middle of the map.

use overmind_types::Point;

use crate::error::WorldError;
use crate::terrain::GridTerrain;

/// Map side length in cells.
pub const SKIRMISH_MAP_SIZE: u32 = 96;

/// The default skirmish map and its landmarks.
#[derive(Debug, Clone)]
pub struct SkirmishMap {
    /// The terrain grid, with chokepoints registered.
    pub terrain: GridTerrain,
    /// Friendly bases, main first.
    pub own_bases: Vec<Point>,
    /// Enemy bases, main first, natural second.
    pub enemy_bases: Vec<Point>,
    /// Center of the friendly main ramp.
    pub own_ramp: Point,
    /// Center of the enemy main ramp.
    pub enemy_ramp: Point,
}

/// Build the default skirmish map.
///
/// # Errors
///
/// Returns [`WorldError::InvalidGrid`] only if the grid constants are
/// changed to zero.
pub fn create_skirmish_map() -> Result<SkirmishMap, WorldError> {
    let own_ramp = Point::new(21.0, 16.0);
    let enemy_ramp = Point::new(75.0, 80.0);

    let mut terrain = GridTerrain::new(SKIRMISH_MAP_SIZE, SKIRMISH_MAP_SIZE)?
        .with_chokepoints(vec![own_ramp, enemy_ramp]);

    // Friendly main cliff: x 20..=21, open at rows 14..=17.
    terrain.block_rect(20, 0, 21, 13);
    terrain.block_rect(20, 18, 21, 24);
    terrain.block_rect(0, 24, 21, 25);

    // Enemy main cliff mirrors the friendly one.
    terrain.block_rect(74, 72, 75, 77);
    terrain.block_rect(74, 82, 75, 95);
    terrain.block_rect(74, 70, 95, 71);

    // Center rocks.
    terrain.block_rect(46, 46, 49, 49);

    Ok(SkirmishMap {
        terrain,
        own_bases: vec![Point::new(10.0, 10.0), Point::new(32.0, 12.0)],
        enemy_bases: vec![Point::new(86.0, 86.0), Point::new(64.0, 84.0)],
        own_ramp,
        enemy_ramp,
    })
}
