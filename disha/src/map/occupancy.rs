//! Occupancy field with a derived low-resolution grid.
//!
//! ```text
//!   high-res field (map_rows × map_cols)        low-res grid (R × C)
//!   ┌──────────────────────────┐               ┌──────────┐
//!   │ 0.0 free .. 1.0 occupied │  area-average │          │
//!   │ rows follow +X           │ ────────────► │ min-max  │
//!   │ cols follow +Y           │  normalize    │ clipped  │
//!   └──────────────────────────┘               └──────────┘
//! ```
//!
//! The map is immutable once built. Its [`OccupancyMap::id`] is a stable
//! hash of dimensions, limits and cell values, used to key cached
//! reference tables.

use crate::core::{GridGeometry, GridLimits, GridShape, to_index, to_real};
use crate::error::{LocalizationError, Result};

/// Cells at or above this value stop rays and block the robot.
pub const OCCUPIED_THRESHOLD: f32 = 0.5;

/// 2-D occupancy map.
#[derive(Clone, Debug)]
pub struct OccupancyMap {
    rows: usize,
    cols: usize,
    x_limits: GridLimits,
    y_limits: GridLimits,
    cells: Vec<f32>,
    grid_rows: usize,
    grid_cols: usize,
    low_res: Vec<f32>,
    id: u64,
}

impl OccupancyMap {
    /// Build a map from row-major cell values.
    ///
    /// Values are clipped to [0, 1]; NaN is treated as free.
    pub fn from_cells(
        rows: usize,
        cols: usize,
        x_limits: GridLimits,
        y_limits: GridLimits,
        cells: Vec<f32>,
        grid_rows: usize,
        grid_cols: usize,
    ) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(LocalizationError::config("map has zero resolution"));
        }
        if grid_rows == 0 || grid_cols == 0 {
            return Err(LocalizationError::config("grid has zero resolution"));
        }
        if !x_limits.is_valid() || !y_limits.is_valid() {
            return Err(LocalizationError::config("map limits are empty or not finite"));
        }
        if cells.len() != rows * cols {
            return Err(LocalizationError::config(format!(
                "map expects {} cells, got {}",
                rows * cols,
                cells.len()
            )));
        }

        let cells: Vec<f32> = cells
            .into_iter()
            .map(|v| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) })
            .collect();
        let low_res = downsample(&cells, rows, cols, grid_rows, grid_cols);
        let id = map_identity(rows, cols, x_limits, y_limits, &cells);

        Ok(Self {
            rows,
            cols,
            x_limits,
            y_limits,
            cells,
            grid_rows,
            grid_cols,
            low_res,
            id,
        })
    }

    /// All-free map
    pub fn empty(
        rows: usize,
        cols: usize,
        x_limits: GridLimits,
        y_limits: GridLimits,
        grid_rows: usize,
        grid_cols: usize,
    ) -> Result<Self> {
        Self::from_cells(
            rows,
            cols,
            x_limits,
            y_limits,
            vec![0.0; rows * cols],
            grid_rows,
            grid_cols,
        )
    }

    /// High-res rows (along X)
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// High-res columns (along Y)
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// X extent
    pub fn x_limits(&self) -> GridLimits {
        self.x_limits
    }

    /// Y extent
    pub fn y_limits(&self) -> GridLimits {
        self.y_limits
    }

    /// Row-major high-res cells
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    /// Size of a high-res pixel along X (meters)
    pub fn pixel_size(&self) -> f64 {
        self.x_limits.cell_size(self.rows)
    }

    /// Low-res grid dimensions (R, C)
    pub fn grid_dims(&self) -> (usize, usize) {
        (self.grid_rows, self.grid_cols)
    }

    /// Row-major low-res grid in [0, 1]
    pub fn low_res(&self) -> &[f32] {
        &self.low_res
    }

    /// Stable identity hash
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Belief geometry over this map with `headings` heading bins
    pub fn geometry(&self, headings: usize) -> GridGeometry {
        GridGeometry::new(
            GridShape::new(headings, self.grid_rows, self.grid_cols),
            self.x_limits,
            self.y_limits,
        )
    }

    /// Value of a high-res pixel
    #[inline]
    pub fn value(&self, row: usize, col: usize) -> f32 {
        self.cells[row * self.cols + col]
    }

    /// High-res pixel containing a world point (may be out of bounds)
    #[inline]
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (i64, i64) {
        (
            to_index(x, self.rows, self.x_limits),
            to_index(y, self.cols, self.y_limits),
        )
    }

    /// World coordinate of a pixel centre
    #[inline]
    pub fn pixel_center(&self, row: i64, col: i64) -> (f64, f64) {
        (
            to_real(row, self.x_limits, self.rows),
            to_real(col, self.y_limits, self.cols),
        )
    }

    /// Occupancy at a world point, `None` outside the map
    #[inline]
    pub fn occupancy_at(&self, x: f64, y: f64) -> Option<f32> {
        let (r, c) = self.world_to_pixel(x, y);
        if r < 0 || c < 0 || r as usize >= self.rows || c as usize >= self.cols {
            return None;
        }
        Some(self.value(r as usize, c as usize))
    }

    /// Whether a disc of `radius` at (x, y) touches an occupied pixel or
    /// leaves the map. A zero radius checks the single pixel under (x, y).
    pub fn collides(&self, x: f64, y: f64, radius: f64) -> bool {
        let (r0, c0) = self.world_to_pixel(x - radius, y - radius);
        let (r1, c1) = self.world_to_pixel(x + radius, y + radius);
        if r0 < 0 || c0 < 0 || r1 >= self.rows as i64 || c1 >= self.cols as i64 {
            return true;
        }
        if radius <= 0.0 {
            return self.value(r0 as usize, c0 as usize) >= OCCUPIED_THRESHOLD;
        }

        for r in r0..=r1 {
            for c in c0..=c1 {
                if self.value(r as usize, c as usize) < OCCUPIED_THRESHOLD {
                    continue;
                }
                let (px, py) = self.pixel_center(r, c);
                if ((px - x).powi(2) + (py - y).powi(2)).sqrt() <= radius {
                    return true;
                }
            }
        }
        false
    }

    /// Per low-res cell flag: cell centre collides at `radius`.
    pub fn blocked_cells(&self, radius: f64) -> Vec<bool> {
        let mut blocked = Vec::with_capacity(self.grid_rows * self.grid_cols);
        for row in 0..self.grid_rows {
            let x = to_real(row as i64, self.x_limits, self.grid_rows);
            for col in 0..self.grid_cols {
                let y = to_real(col as i64, self.y_limits, self.grid_cols);
                blocked.push(self.collides(x, y, radius));
            }
        }
        blocked
    }
}

/// Area-averaged resize, then min-max normalization and clipping.
pub fn downsample(
    src: &[f32],
    src_rows: usize,
    src_cols: usize,
    dst_rows: usize,
    dst_cols: usize,
) -> Vec<f32> {
    let row_weights = area_weights(src_rows, dst_rows);
    let col_weights = area_weights(src_cols, dst_cols);

    // Resize columns first, then rows
    let mut tmp = vec![0.0f64; src_rows * dst_cols];
    for r in 0..src_rows {
        let src_row = &src[r * src_cols..(r + 1) * src_cols];
        for (j, weights) in col_weights.iter().enumerate() {
            tmp[r * dst_cols + j] = weights.iter().map(|&(k, w)| src_row[k] as f64 * w).sum();
        }
    }

    let mut out = vec![0.0f64; dst_rows * dst_cols];
    for (i, weights) in row_weights.iter().enumerate() {
        for j in 0..dst_cols {
            out[i * dst_cols + j] = weights.iter().map(|&(k, w)| tmp[k * dst_cols + j] * w).sum();
        }
    }

    let (lo, hi) = out
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    out.into_iter()
        .map(|v| {
            let v = if hi > lo { (v - lo) / (hi - lo) } else { v };
            v.clamp(0.0, 1.0) as f32
        })
        .collect()
}

/// For each destination index, the contributing source indices and their
/// area weights (summing to 1).
fn area_weights(src: usize, dst: usize) -> Vec<Vec<(usize, f64)>> {
    let scale = src as f64 / dst as f64;
    (0..dst)
        .map(|i| {
            let start = i as f64 * scale;
            let end = (i + 1) as f64 * scale;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src);
            (first..last)
                .filter_map(|k| {
                    let overlap = end.min((k + 1) as f64) - start.max(k as f64);
                    (overlap > 1e-12).then_some((k, overlap / scale))
                })
                .collect()
        })
        .collect()
}

/// FNV-1a over dimensions, limits and cell bits.
fn map_identity(
    rows: usize,
    cols: usize,
    x_limits: GridLimits,
    y_limits: GridLimits,
    cells: &[f32],
) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    let mut feed = |bytes: &[u8]| {
        for b in bytes {
            hash ^= *b as u64;
            hash = hash.wrapping_mul(PRIME);
        }
    };
    feed(&(rows as u64).to_le_bytes());
    feed(&(cols as u64).to_le_bytes());
    for v in [x_limits.lo, x_limits.hi, y_limits.lo, y_limits.hi] {
        feed(&v.to_le_bytes());
    }
    for v in cells {
        feed(&v.to_le_bytes());
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> GridLimits {
        GridLimits::new(-1.0, 1.0)
    }

    fn walled_map() -> OccupancyMap {
        // 20x20 pixels, 0.1 m each, occupied border
        let n = 20;
        let mut cells = vec![0.0; n * n];
        for i in 0..n {
            cells[i] = 1.0;
            cells[(n - 1) * n + i] = 1.0;
            cells[i * n] = 1.0;
            cells[i * n + n - 1] = 1.0;
        }
        OccupancyMap::from_cells(n, n, limits(), limits(), cells, 4, 4).unwrap()
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(OccupancyMap::empty(0, 10, limits(), limits(), 2, 2).is_err());
        assert!(OccupancyMap::empty(10, 10, limits(), limits(), 0, 2).is_err());
        assert!(
            OccupancyMap::empty(10, 10, GridLimits::new(1.0, 1.0), limits(), 2, 2).is_err()
        );
        assert!(OccupancyMap::from_cells(2, 2, limits(), limits(), vec![0.0; 3], 1, 1).is_err());
    }

    #[test]
    fn test_collision_border() {
        let map = walled_map();
        assert!(!map.collides(0.0, 0.0, 0.3));
        assert!(map.collides(0.0, 0.0, 0.97));
        assert!(map.collides(0.95, 0.0, 0.0));
        assert!(!map.collides(0.75, 0.0, 0.0));
        // Leaving the map always collides
        assert!(map.collides(1.5, 0.0, 0.0));
    }

    #[test]
    fn test_occupancy_at() {
        let map = walled_map();
        assert_eq!(map.occupancy_at(-0.95, 0.0), Some(1.0));
        assert_eq!(map.occupancy_at(0.0, 0.0), Some(0.0));
        assert_eq!(map.occupancy_at(1.0, 0.0), None);
    }

    #[test]
    fn test_low_res_normalized() {
        let map = walled_map();
        let grid = map.low_res();
        assert_eq!(grid.len(), 16);
        let max = grid.iter().cloned().fold(f32::MIN, f32::max);
        let min = grid.iter().cloned().fold(f32::MAX, f32::min);
        assert!((max - 1.0).abs() < 1e-6);
        assert!(min.abs() < 1e-6);
        // Corner cells see more wall than centre cells
        assert!(grid[0] > grid[5]);
    }

    #[test]
    fn test_area_weights_sum_to_one() {
        for (src, dst) in [(224, 11), (20, 4), (7, 3), (5, 5)] {
            for weights in area_weights(src, dst) {
                let total: f64 = weights.iter().map(|(_, w)| w).sum();
                assert!((total - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_identity_changes_with_content() {
        let a = OccupancyMap::empty(10, 10, limits(), limits(), 2, 2).unwrap();
        let b = OccupancyMap::empty(10, 10, limits(), limits(), 2, 2).unwrap();
        assert_eq!(a.id(), b.id());

        let mut cells = vec![0.0; 100];
        cells[55] = 1.0;
        let c = OccupancyMap::from_cells(10, 10, limits(), limits(), cells, 2, 2).unwrap();
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn test_blocked_cells() {
        let map = walled_map();
        let blocked = map.blocked_cells(0.05);
        assert_eq!(blocked.len(), 16);
        // Cell centres at ±0.75, ±0.25 are inside the border
        assert!(blocked.iter().all(|b| !b));
        let blocked = map.blocked_cells(0.25);
        assert!(blocked[0]);
        assert!(!blocked[5]);
    }
}
