//! Test utilities for Disha integration tests.
//!
//! Map builders, scan options and logger setup shared by the test files.

#![allow(dead_code)]

use std::sync::Arc;

use disha::sensor::{BuildOptions, CancelToken, ReferenceScanTable, ScanOptions};
use disha::{GridLimits, OccupancyMap};

/// Initialize test logging once.
pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// Noiseless, unjittered scan options.
pub fn clean_scan(rays: usize, max_range: f64) -> ScanOptions {
    ScanOptions {
        max_range,
        rays,
        step: 0.02,
        step_jitter: 0.0,
        ..ScanOptions::default()
    }
}

/// Square `n × n` pixel map over `[-half, half)` on both axes.
pub fn square_map(
    n: usize,
    half: f64,
    grid: usize,
    occupied: impl Fn(usize, usize) -> bool,
) -> OccupancyMap {
    let mut cells = vec![0.0f32; n * n];
    for r in 0..n {
        for c in 0..n {
            if occupied(r, c) {
                cells[r * n + c] = 1.0;
            }
        }
    }
    let lim = GridLimits::new(-half, half);
    OccupancyMap::from_cells(n, n, lim, lim, cells, grid, grid).unwrap()
}

/// All-free map.
pub fn empty_map(n: usize, half: f64, grid: usize) -> OccupancyMap {
    square_map(n, half, grid, |_, _| false)
}

/// One-pixel rim plus an off-centre block, so poses are distinguishable.
///
/// 60 × 60 px over 3 m, 3 × 3 grid.
pub fn room() -> OccupancyMap {
    let n = 60;
    square_map(n, 1.5, 3, |r, c| {
        let rim = r == 0 || c == 0 || r == n - 1 || c == n - 1;
        rim || ((42..48).contains(&r) && (42..55).contains(&c))
    })
}

/// Reference table of `map`, single-threaded.
pub fn table_for(map: &OccupancyMap, options: &ScanOptions) -> ReferenceScanTable {
    ReferenceScanTable::build(map, options, BuildOptions::default(), &CancelToken::new()).unwrap()
}

/// `room()` with its table, shared.
pub fn room_fixture(options: &ScanOptions) -> (Arc<OccupancyMap>, Arc<ReferenceScanTable>) {
    let map = room();
    let table = table_for(&map, options);
    (Arc::new(map), Arc::new(table))
}
