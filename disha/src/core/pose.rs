//! Continuous and discrete pose types.
//!
//! A [`Pose`] lives in world units. A [`GridPose`] indexes the belief
//! tensor and is always derived from a `Pose` through [`GridGeometry`].

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::math::{GridLimits, TWO_PI, to_index, to_real, wrap, wrap_2pi};

/// Continuous pose `(theta, x, y)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Heading in radians, CCW positive from +X
    pub theta: f64,
    /// X position in meters
    pub x: f64,
    /// Y position in meters
    pub y: f64,
}

impl Pose {
    /// Create a new pose, heading wrapped to (-π, π]
    #[inline]
    pub fn new(theta: f64, x: f64, y: f64) -> Self {
        Self {
            theta: wrap(theta),
            x,
            y,
        }
    }

    /// Euclidean distance between positions
    #[inline]
    pub fn distance(&self, other: &Pose) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Belief tensor dimensions D×R×C.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    /// Number of discrete headings (D)
    pub headings: usize,
    /// Grid rows (R), along X
    pub rows: usize,
    /// Grid columns (C), along Y
    pub cols: usize,
}

impl GridShape {
    /// Create a new shape
    pub const fn new(headings: usize, rows: usize, cols: usize) -> Self {
        Self {
            headings,
            rows,
            cols,
        }
    }

    /// Total number of poses
    #[inline]
    pub fn len(&self) -> usize {
        self.headings * self.rows * self.cols
    }

    /// True if any dimension is zero
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cells in one heading slice
    #[inline]
    pub fn slice_len(&self) -> usize {
        self.rows * self.cols
    }

    /// Flattened index (head-major, then row, then column)
    #[inline]
    pub fn index(&self, pose: GridPose) -> usize {
        (pose.head * self.rows + pose.row) * self.cols + pose.col
    }

    /// Inverse of [`GridShape::index`]
    #[inline]
    pub fn unravel(&self, index: usize) -> GridPose {
        let slice = self.slice_len();
        GridPose {
            head: index / slice,
            row: (index % slice) / self.cols,
            col: index % self.cols,
        }
    }

    /// Whether a grid pose is inside the tensor
    #[inline]
    pub fn contains(&self, pose: GridPose) -> bool {
        pose.head < self.headings && pose.row < self.rows && pose.col < self.cols
    }

    /// Angular width of one heading bin
    #[inline]
    pub fn heading_resolution(&self) -> f64 {
        TWO_PI / self.headings as f64
    }
}

/// Discrete pose `(head, row, col)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPose {
    /// Heading bin in `[0, D)`
    pub head: usize,
    /// Row in `[0, R)`
    pub row: usize,
    /// Column in `[0, C)`
    pub col: usize,
}

impl GridPose {
    /// Create a new grid pose
    pub const fn new(head: usize, row: usize, col: usize) -> Self {
        Self { head, row, col }
    }

    /// Manhattan distance with circular heading distance.
    ///
    /// With `ignore_heading` only the spatial part counts.
    pub fn manhattan(&self, other: &GridPose, headings: usize, ignore_heading: bool) -> usize {
        let spatial = self.row.abs_diff(other.row) + self.col.abs_diff(other.col);
        if ignore_heading {
            return spatial;
        }
        let dh = self.head.abs_diff(other.head) % headings.max(1);
        spatial + dh.min(headings - dh)
    }
}

/// Grid shape plus the world extent it covers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Tensor dimensions
    pub shape: GridShape,
    /// X extent (rows)
    pub x_limits: GridLimits,
    /// Y extent (columns)
    pub y_limits: GridLimits,
}

impl GridGeometry {
    /// Create a new geometry
    pub fn new(shape: GridShape, x_limits: GridLimits, y_limits: GridLimits) -> Self {
        Self {
            shape,
            x_limits,
            y_limits,
        }
    }

    /// Derive the grid pose for a continuous pose.
    ///
    /// Heading bins are centred on `head * 2π/D`. Returns `None` when the
    /// position lies outside the grid.
    pub fn grid_pose(&self, pose: &Pose) -> Option<GridPose> {
        let row = to_index(pose.x, self.shape.rows, self.x_limits);
        let col = to_index(pose.y, self.shape.cols, self.y_limits);
        if row < 0 || col < 0 || row as usize >= self.shape.rows || col as usize >= self.shape.cols
        {
            return None;
        }
        Some(GridPose {
            head: self.heading_index(pose.theta),
            row: row as usize,
            col: col as usize,
        })
    }

    /// Heading bin containing `theta`
    pub fn heading_index(&self, theta: f64) -> usize {
        let d = self.shape.headings;
        let shifted = wrap_2pi(theta + PI / d as f64);
        (shifted / self.shape.heading_resolution()).floor() as usize % d
    }

    /// Continuous pose at the centre of a grid cell
    pub fn cell_pose(&self, grid: GridPose) -> Pose {
        Pose::new(
            grid.head as f64 * self.shape.heading_resolution(),
            to_real(grid.row as i64, self.x_limits, self.shape.rows),
            to_real(grid.col as i64, self.y_limits, self.shape.cols),
        )
    }

    /// Cell size along X and Y
    pub fn cell_size(&self) -> (f64, f64) {
        (
            self.x_limits.cell_size(self.shape.rows),
            self.y_limits.cell_size(self.shape.cols),
        )
    }
}
