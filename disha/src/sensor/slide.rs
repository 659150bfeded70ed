//! Forward collision check from the live scan.
//!
//! The heading-0 scan image is dilated toward the robot by the distance
//! one forward step sweeps (`collision_radius + step`) and sideways by the
//! robot radius. If the pixel under the robot ends up occupied, going
//! forward would hit something seen in the scan.
//!
//! ```text
//!          +X (forward)
//!   ■                ■■■■■
//!   │      dilate    ■■■■■  ← front margin
//!   ●     ───────►   ■■●■■  ← side margin
//! ```
//!
//! Pixels shifted in from outside the raster count as occupied.

use crate::core::{GridLimits, to_index};

use super::image::ScanImageStack;

/// Blocked mass threshold for the robot pixel
const BLOCKED_THRESHOLD: f32 = 0.5;

/// Dilated robot-centred obstacle raster.
#[derive(Clone, Debug)]
pub struct SlideMap {
    rows: usize,
    cols: usize,
    x_limits: GridLimits,
    y_limits: GridLimits,
    cells: Vec<f32>,
}

impl SlideMap {
    /// Dilation margins in pixels `(front, side)`.
    pub fn margins(collision_radius: f64, forward_step_m: f64, pixel: f64) -> (usize, usize) {
        (
            ((collision_radius + forward_step_m) / pixel).ceil().max(0.0) as usize,
            (collision_radius / pixel).ceil().max(0.0) as usize,
        )
    }

    /// Build from the heading-0 image of a scan stack.
    pub fn from_stack(stack: &ScanImageStack, front: usize, side: usize) -> Self {
        let (rows, cols) = stack.dims();
        let (x_limits, y_limits) = stack.limits();
        let mut cells = stack.image(0).to_vec();

        // Forward obstacles slide back toward the robot (decreasing row)
        for _ in 0..front {
            let shifted = shift(&cells, rows, cols, 1, 0);
            add_clip(&mut cells, &shifted);
        }
        for _ in 0..side {
            let left = shift(&cells, rows, cols, 0, 1);
            add_clip(&mut cells, &left);
            let right = shift(&cells, rows, cols, 0, -1);
            add_clip(&mut cells, &right);
        }

        Self {
            rows,
            cols,
            x_limits,
            y_limits,
            cells,
        }
    }

    /// Raster size (rows, cols)
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Row-major dilated raster in [0, 1]
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    /// Whether the pixel under the robot is blocked
    pub fn forward_blocked(&self) -> bool {
        let r = to_index(0.0, self.rows, self.x_limits);
        let c = to_index(0.0, self.cols, self.y_limits);
        if r < 0 || c < 0 || r as usize >= self.rows || c as usize >= self.cols {
            return true;
        }
        self.cells[r as usize * self.cols + c as usize] > BLOCKED_THRESHOLD
    }
}

/// `out[r][c] = src[r + dr][c + dc]`, 1.0 where the source is outside.
fn shift(src: &[f32], rows: usize, cols: usize, dr: i64, dc: i64) -> Vec<f32> {
    let mut out = vec![1.0f32; src.len()];
    for r in 0..rows as i64 {
        let sr = r + dr;
        if sr < 0 || sr >= rows as i64 {
            continue;
        }
        for c in 0..cols as i64 {
            let sc = c + dc;
            if sc < 0 || sc >= cols as i64 {
                continue;
            }
            out[(r * cols as i64 + c) as usize] = src[(sr * cols as i64 + sc) as usize];
        }
    }
    out
}

fn add_clip(dst: &mut [f32], src: &[f32]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = (*d + *s).clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::scan::RangeScan;

    fn stack_with_hit(ray: usize, dist: f64) -> ScanImageStack {
        let lim = GridLimits::new(-2.0, 2.0);
        let mut ranges = vec![f64::INFINITY; 360];
        ranges[ray] = dist;
        ScanImageStack::render(&RangeScan::new(ranges), 4, 80, 80, lim, lim)
    }

    #[test]
    fn test_margins() {
        assert_eq!(SlideMap::margins(0.25, 0.5, 0.05), (15, 5));
    }

    #[test]
    fn test_near_obstacle_ahead_blocks() {
        let stack = stack_with_hit(0, 0.5);
        let (front, side) = SlideMap::margins(0.25, 0.5, 0.05);
        assert!(SlideMap::from_stack(&stack, front, side).forward_blocked());
    }

    #[test]
    fn test_far_obstacle_does_not_block() {
        let stack = stack_with_hit(0, 1.5);
        let (front, side) = SlideMap::margins(0.25, 0.5, 0.05);
        assert!(!SlideMap::from_stack(&stack, front, side).forward_blocked());
    }

    #[test]
    fn test_obstacle_behind_does_not_block() {
        let stack = stack_with_hit(180, 0.3);
        let (front, side) = SlideMap::margins(0.25, 0.5, 0.05);
        assert!(!SlideMap::from_stack(&stack, front, side).forward_blocked());
    }
}
