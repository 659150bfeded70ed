//! Reference scan table: one noiseless scan per grid cell.
//!
//! The table is `R × C × rays`, built once per map by fork-join over cells.
//! Each cell writes its own disjoint slice and draws step jitter from its
//! own seeded stream, so the output is identical for any worker count.
//!
//! ```text
//!   data: [ cell(0,0): r0 r1 … r359 | cell(0,1): … | … | cell(R-1,C-1): … ]
//!           ▲ par_chunks_mut(rays), one task per cell
//! ```
//!
//! A build either completes or returns [`LocalizationError::Cancelled`];
//! partial tables are never handed out.

use log::{debug, info, warn};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::core::{Pose, to_real};
use crate::error::{LocalizationError, Result};
use crate::map::OccupancyMap;

use super::noise::NoiseGenerator;
use super::raycaster::{ScanOptions, cast_scan};
use super::scan::RangeScan;

/// Shared cancellation flag for long builds.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an unset token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Worker-pool settings for the table build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Dedicated worker threads (0 = global rayon pool)
    pub workers: usize,
    /// Base seed for per-cell jitter streams (0 = derive from map id)
    pub seed: u64,
}

/// Precomputed `R × C × rays` scans, clamped to `[min_range, max_range]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceScanTable {
    rows: usize,
    cols: usize,
    rays: usize,
    min_range: f64,
    max_range: f64,
    map_id: u64,
    data: Vec<f64>,
}

impl ReferenceScanTable {
    /// Build the table for every low-res cell of `map`.
    pub fn build(
        map: &OccupancyMap,
        options: &ScanOptions,
        build: BuildOptions,
        cancel: &CancelToken,
    ) -> Result<Self> {
        options.validate()?;
        let (rows, cols) = map.grid_dims();
        let rays = options.rays;
        let cast = options.noiseless();
        let seed = if build.seed == 0 { map.id() } else { build.seed };
        let (min, max) = (options.min_range, options.max_range);
        let start = Instant::now();

        let mut data = vec![0.0f64; rows * cols * rays];
        let fill = |data: &mut Vec<f64>| {
            data.par_chunks_mut(rays)
                .enumerate()
                .try_for_each(|(cell, out)| {
                    if cancel.is_cancelled() {
                        return Err(LocalizationError::Cancelled);
                    }
                    let (row, col) = (cell / cols, cell % cols);
                    let pose = Pose::new(
                        0.0,
                        to_real(row as i64, map.x_limits(), rows),
                        to_real(col as i64, map.y_limits(), cols),
                    );
                    let mut noise = NoiseGenerator::for_stream(seed, cell as u64);
                    let scan = cast_scan(&pose, map, &cast, &mut noise);
                    for (dst, r) in out.iter_mut().zip(scan.ranges()) {
                        *dst = r.clamp(min, max);
                    }
                    Ok(())
                })
        };

        let result = if build.workers > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(build.workers)
                .build()
                .map_err(|e| LocalizationError::config(format!("worker pool: {}", e)))?;
            pool.install(|| fill(&mut data))
        } else {
            fill(&mut data)
        };

        if let Err(e) = result {
            warn!("[RefTable] build aborted: {}", e);
            return Err(e);
        }
        if cancel.is_cancelled() {
            warn!("[RefTable] cancelled after completion, discarding");
            return Err(LocalizationError::Cancelled);
        }

        info!(
            "[RefTable] built {}x{}x{} in {:.1} ms",
            rows,
            cols,
            rays,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(Self {
            rows,
            cols,
            rays,
            min_range: min,
            max_range: max,
            map_id: map.id(),
            data,
        })
    }

    /// Reassemble a table from stored parts
    pub fn from_parts(
        rows: usize,
        cols: usize,
        rays: usize,
        min_range: f64,
        max_range: f64,
        map_id: u64,
        data: Vec<f64>,
    ) -> Result<Self> {
        if !(min_range.is_finite() && max_range.is_finite() && min_range < max_range) {
            return Err(LocalizationError::config(format!(
                "invalid range bounds [{}, {}]",
                min_range, max_range
            )));
        }
        if data.len() != rows * cols * rays {
            return Err(LocalizationError::config(format!(
                "reference table expects {} ranges, got {}",
                rows * cols * rays,
                data.len()
            )));
        }
        debug!("[RefTable] restored {}x{}x{} for map {:016x}", rows, cols, rays, map_id);
        Ok(Self {
            rows,
            cols,
            rays,
            min_range,
            max_range,
            map_id,
            data,
        })
    }

    /// Grid rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Grid columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Rays per scan
    pub fn rays(&self) -> usize {
        self.rays
    }

    /// Clamp bounds `(min, max)`
    pub fn range_bounds(&self) -> (f64, f64) {
        (self.min_range, self.max_range)
    }

    /// Identity of the map the table was built for
    pub fn map_id(&self) -> u64 {
        self.map_id
    }

    /// Flat data in cell-major order
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Reference scan of one cell (heading 0)
    #[inline]
    pub fn scan(&self, row: usize, col: usize) -> &[f64] {
        let start = (row * self.cols + col) * self.rays;
        &self.data[start..start + self.rays]
    }

    /// Reference scan of one cell seen at heading bin `head` of `headings`
    pub fn rotated_scan(&self, row: usize, col: usize, head: usize, headings: usize) -> RangeScan {
        let offset = heading_ray_offset(head, headings, self.rays);
        RangeScan::new(self.scan(row, col).to_vec()).rotated(offset)
    }
}

/// Ray offset of heading bin `head`, rounded to the nearest ray
#[inline]
pub fn heading_ray_offset(head: usize, headings: usize, rays: usize) -> usize {
    ((head * rays) as f64 / headings as f64).round() as usize % rays.max(1)
}
