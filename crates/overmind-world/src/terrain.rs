//! Terrain oracle trait and a grid-backed implementation.
//!
//! Path-finding and terrain-mesh generation live outside the engine. The
//! engine only asks three questions of the map: whether a point can be walked
//! on, where the chokepoints are, and where the middle of the map is. The
//! [`TerrainOracle`] trait captures that contract. [`GridTerrain`] answers it
//! from a simple blocked-cell grid and backs the headless skirmish host and
//! the test suites.

use std::collections::BTreeSet;

use overmind_types::Point;

use crate::error::WorldError;

/// Read-only terrain queries consumed by the engine.
pub trait TerrainOracle {
    /// Whether a ground unit can stand at `point`.
    fn is_traversable(&self, point: Point) -> bool;

    /// All known chokepoint centers.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::TerrainUnavailable`] when the oracle cannot
    /// answer (e.g. map analysis has not finished).
    fn nearest_chokepoints(&self) -> Result<Vec<Point>, WorldError>;

    /// Geometric center of the playable area.
    fn map_center(&self) -> Point;

    /// Obstacle points within `radius` of `point`, for terrain repulsion.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::TerrainUnavailable`] when the oracle cannot
    /// answer. Callers skip terrain repulsion in that case.
    fn obstacles_near(&self, point: Point, radius: f64) -> Result<Vec<Point>, WorldError>;
}

/// A rectangular map of unit-sized cells, some of which are blocked.
///
/// Cell `(x, y)` covers `[x, x + 1) x [y, y + 1)`. Points outside the grid
/// are never traversable.
#[derive(Debug, Clone)]
pub struct GridTerrain {
    width: u32,
    height: u32,
    /// Blocked cells, ordered by column then row for range scans.
    blocked: BTreeSet<(u32, u32)>,
    chokepoints: Vec<Point>,
    available: bool,
}

impl GridTerrain {
    /// Create an open grid with the given dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGrid`] if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidGrid { width, height });
        }
        Ok(Self {
            width,
            height,
            blocked: BTreeSet::new(),
            chokepoints: Vec::new(),
            available: true,
        })
    }

    /// Set the chokepoint list reported by the oracle.
    #[must_use]
    pub fn with_chokepoints(mut self, chokepoints: Vec<Point>) -> Self {
        self.chokepoints = chokepoints;
        self
    }

    /// Mark one cell as blocked. Out-of-range cells are ignored.
    pub fn block_cell(&mut self, x: u32, y: u32) {
        if x < self.width && y < self.height {
            self.blocked.insert((x, y));
        }
    }

    /// Mark every cell in the inclusive rectangle as blocked.
    pub fn block_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32) {
        for x in x0..=x1.min(self.width.saturating_sub(1)) {
            for y in y0..=y1.min(self.height.saturating_sub(1)) {
                self.blocked.insert((x, y));
            }
        }
    }

    /// Toggle availability. An unavailable grid fails its fallible queries.
    pub const fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Grid width in cells.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of blocked cells.
    pub fn blocked_count(&self) -> usize {
        self.blocked.len()
    }

    /// The cell containing `point`, or `None` if it lies off the grid.
    fn cell_of(&self, point: Point) -> Option<(u32, u32)> {
        let x = clamp_coord(point.x, self.width)?;
        let y = clamp_coord(point.y, self.height)?;
        Some((x, y))
    }

    fn check_available(&self) -> Result<(), WorldError> {
        if self.available {
            Ok(())
        } else {
            Err(WorldError::TerrainUnavailable {
                reason: String::from("grid terrain marked unavailable"),
            })
        }
    }
}

/// Floor a world coordinate into a cell index, rejecting out-of-range values.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_coord(value: f64, limit: u32) -> Option<u32> {
    if !value.is_finite() || value < 0.0 || value >= f64::from(limit) {
        return None;
    }
    // Range checked above: 0 <= value < limit <= u32::MAX.
    Some(value.floor() as u32)
}

/// Floor a coordinate that may lie off the grid into `[0, limit - 1]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn saturate_coord(value: f64, limit: u32) -> u32 {
    let max = limit.saturating_sub(1);
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= f64::from(max) {
        max
    } else {
        value.floor() as u32
    }
}

impl TerrainOracle for GridTerrain {
    fn is_traversable(&self, point: Point) -> bool {
        self.cell_of(point)
            .is_some_and(|cell| !self.blocked.contains(&cell))
    }

    fn nearest_chokepoints(&self) -> Result<Vec<Point>, WorldError> {
        self.check_available()?;
        Ok(self.chokepoints.clone())
    }

    fn map_center(&self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    fn obstacles_near(&self, point: Point, radius: f64) -> Result<Vec<Point>, WorldError> {
        self.check_available()?;
        if !point.is_finite() || radius <= 0.0 {
            return Ok(Vec::new());
        }
        let x0 = saturate_coord(point.x - radius, self.width);
        let x1 = saturate_coord(point.x + radius, self.width);
        let y0 = saturate_coord(point.y - radius, self.height);
        let y1 = saturate_coord(point.y + radius, self.height);

        let found = self
            .blocked
            .range((x0, 0)..=(x1, u32::MAX))
            .filter(|(_, y)| (y0..=y1).contains(y))
            .map(|&(x, y)| Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5))
            .filter(|center| center.distance(point) <= radius)
            .collect();
        Ok(found)
    }
}
