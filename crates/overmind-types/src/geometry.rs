//! Planar vector math used by every steering component.
//!
//! A single [`Vec2`] type serves as both a position and a force. All
//! operations are total: normalizing a zero-length vector yields the zero
//! vector instead of `NaN`, and clamping never increases magnitude.

use core::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Below this length a vector is treated as zero.
pub const EPSILON: f64 = 1e-9;

/// A 2D vector or point in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

/// A map position. Same representation as a force vector.
pub type Point = Vec2;

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Construct a vector from components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` radians.
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Squared length (no square root).
    pub fn length_squared(self) -> f64 {
        self.x.mul_add(self.x, self.y * self.y)
    }

    /// Distance between two points.
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Whether the length is below [`EPSILON`].
    pub fn is_zero(self) -> bool {
        self.length() < EPSILON
    }

    /// Whether both components are finite.
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Unit vector in the same direction, or zero for a degenerate vector.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len < EPSILON || !len.is_finite() {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }

    /// Shorten the vector to at most `max` length, keeping its direction.
    pub fn clamp_length(self, max: f64) -> Self {
        let len = self.length();
        if len > max && len > EPSILON {
            self * (max / len)
        } else {
            self
        }
    }

    /// Counter-clockwise 90 degree rotation.
    pub const fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Rotate by `angle` radians counter-clockwise.
    pub fn rotated(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(
            self.x.mul_add(cos, -(self.y * sin)),
            self.x.mul_add(sin, self.y * cos),
        )
    }

    /// Angle of the vector in radians, in `(-pi, pi]`.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Linear interpolation: `t = 0` gives `self`, `t = 1` gives `other`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    /// Point `distance` units from `self` in the direction of `target`.
    ///
    /// Returns `self` unchanged when the two points coincide.
    pub fn towards(self, target: Self, distance: f64) -> Self {
        self + (target - self).normalized() * distance
    }

    /// Arithmetic mean of a set of points, or `None` for an empty set.
    pub fn centroid<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut sum = Self::ZERO;
        let mut count: u32 = 0;
        for p in points {
            sum += p;
            count = count.saturating_add(1);
        }
        if count == 0 {
            None
        } else {
            Some(sum * (1.0 / f64::from(count)))
        }
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl core::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn zero_vector_normalizes_to_zero() {
        assert!(Vec2::ZERO.normalized().is_zero());
        let nan = Vec2::new(f64::NAN, 1.0);
        assert!(nan.normalized().is_zero());
    }

    #[test]
    fn clamp_only_shrinks() {
        let v = Vec2::new(3.0, 4.0);
        assert!(close(v.clamp_length(2.5).length(), 2.5));
        assert!(close(v.clamp_length(10.0).length(), 5.0));
    }

    #[test]
    fn perpendicular_is_orthogonal() {
        let v = Vec2::new(2.0, -7.0);
        assert!(close(v.dot(v.perpendicular()), 0.0));
        assert!(close(v.perpendicular().length(), v.length()));
    }

    #[test]
    fn rotation_by_quarter_turn_matches_perpendicular() {
        let v = Vec2::new(1.5, 0.5);
        let r = v.rotated(core::f64::consts::FRAC_PI_2);
        let p = v.perpendicular();
        assert!(close(r.x, p.x));
        assert!(close(r.y, p.y));
    }

    #[test]
    fn centroid_of_empty_set_is_none() {
        assert!(Vec2::centroid(core::iter::empty()).is_none());
        let c = Vec2::centroid([Vec2::new(0.0, 0.0), Vec2::new(4.0, 2.0)]);
        assert_eq!(c, Some(Vec2::new(2.0, 1.0)));
    }

    #[test]
    fn towards_coincident_point_stays_put() {
        let p = Vec2::new(5.0, 5.0);
        assert_eq!(p.towards(p, 3.0), p);
        let q = p.towards(Vec2::new(5.0, 10.0), 2.0);
        assert!(close(q.y, 7.0));
    }
}
