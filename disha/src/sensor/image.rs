//! Robot-centred scan rasters, one per heading.
//!
//! Scan endpoints are drawn into a raster with the map's resolution and
//! extent, the sensor sitting at world origin. Image `h` rotates the
//! endpoints by `h · 2π/D`, which is what a learned likelihood provider
//! consumes as its "rotated scan stack".

use std::f64::consts::TAU;

use crate::core::{GridLimits, to_index};

use super::scan::RangeScan;

/// `D` binary scan images of `rows × cols` pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanImageStack {
    headings: usize,
    rows: usize,
    cols: usize,
    x_limits: GridLimits,
    y_limits: GridLimits,
    data: Vec<f32>,
}

impl ScanImageStack {
    /// Rasterize `scan` once per heading. Non-finite ranges are skipped.
    pub fn render(
        scan: &RangeScan,
        headings: usize,
        rows: usize,
        cols: usize,
        x_limits: GridLimits,
        y_limits: GridLimits,
    ) -> Self {
        let mut data = vec![0.0f32; headings * rows * cols];
        for (h, image) in data.chunks_mut(rows * cols).enumerate() {
            let offset = TAU / headings as f64 * h as f64;
            for (i, &dist) in scan.ranges().iter().enumerate() {
                if !dist.is_finite() {
                    continue;
                }
                let angle = offset + scan.ray_angle(i);
                let r = to_index(dist * angle.cos(), rows, x_limits);
                let c = to_index(dist * angle.sin(), cols, y_limits);
                if r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols {
                    image[r as usize * cols + c as usize] = 1.0;
                }
            }
        }
        Self {
            headings,
            rows,
            cols,
            x_limits,
            y_limits,
            data,
        }
    }

    /// Number of images
    pub fn headings(&self) -> usize {
        self.headings
    }

    /// Raster size (rows, cols)
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Raster extent
    pub fn limits(&self) -> (GridLimits, GridLimits) {
        (self.x_limits, self.y_limits)
    }

    /// Image for heading `h`, row-major
    pub fn image(&self, h: usize) -> &[f32] {
        let len = self.rows * self.cols;
        &self.data[h * len..(h + 1) * len]
    }

    /// All images, heading-major
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}
