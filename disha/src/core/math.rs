//! Grid/world conversions and angle wrapping.
//!
//! All angles are in radians, counter-clockwise positive from +X.
//! Grid rows follow X and grid columns follow Y; indices increase with
//! the coordinate.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Two times PI (full circle in radians).
pub const TWO_PI: f64 = TAU;

/// Closed-open coordinate interval `[lo, hi)` covered by a grid axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridLimits {
    /// Lower bound (inclusive)
    pub lo: f64,
    /// Upper bound (exclusive)
    pub hi: f64,
}

impl GridLimits {
    /// Create new limits
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Extent `hi - lo`
    #[inline]
    pub fn span(&self) -> f64 {
        self.hi - self.lo
    }

    /// Limits are usable for indexing
    pub fn is_valid(&self) -> bool {
        self.lo.is_finite() && self.hi.is_finite() && self.hi > self.lo
    }

    /// Size of one cell when the axis is split into `grid_size` cells
    #[inline]
    pub fn cell_size(&self, grid_size: usize) -> f64 {
        self.span() / grid_size as f64
    }

    /// Whether `value` lies inside `[lo, hi)`
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value < self.hi
    }
}

impl From<[f64; 2]> for GridLimits {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

/// Map a continuous coordinate to a cell index by linear scaling.
///
/// Values outside `[lo, hi)` produce indices outside `[0, grid_size)`;
/// callers bound-check.
///
/// # Example
/// ```
/// use disha::core::math::{to_index, GridLimits};
///
/// let limits = GridLimits::new(-3.0, 3.0);
/// assert_eq!(to_index(-3.0, 6, limits), 0);
/// assert_eq!(to_index(2.99, 6, limits), 5);
/// assert_eq!(to_index(3.5, 6, limits), 6);
/// assert_eq!(to_index(-3.5, 6, limits), -1);
/// ```
#[inline]
pub fn to_index(value: f64, grid_size: usize, limits: GridLimits) -> i64 {
    ((value - limits.lo) / limits.span() * grid_size as f64).floor() as i64
}

/// Coordinate of the centre of cell `index`.
#[inline]
pub fn to_real(index: i64, limits: GridLimits, grid_size: usize) -> f64 {
    limits.lo + (index as f64 + 0.5) * limits.cell_size(grid_size)
}

/// Normalize angle to (-π, π].
///
/// Values already in range are returned unchanged, so `wrap` is
/// idempotent bit for bit.
#[inline]
pub fn wrap(angle: f64) -> f64 {
    if !angle.is_finite() || (angle > -PI && angle <= PI) {
        return angle;
    }
    let r = PI - (PI - angle).rem_euclid(TAU);
    // rem_euclid can round up to TAU just above π
    if r <= -PI { PI } else { r }
}

/// Normalize angle to [0, 2π).
#[inline]
pub fn wrap_2pi(angle: f64) -> f64 {
    if !angle.is_finite() || (0.0..TAU).contains(&angle) {
        return angle;
    }
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if a >= TAU { 0.0 } else { a }
}

/// Convert degrees to radians.
#[inline]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.0
}
