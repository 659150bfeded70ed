//! Ground-truth likelihood from reference scans.
//!
//! For every pose `(head, row, col)` the cell's reference scan is rotated
//! into heading `head` and scored against the live scan:
//!
//! ```text
//!   live scan ──clamp──┐
//!                      ├─► similarity ─► raw field ─► zero occupied ─► normalize ─► [mask]
//!   ref(row,col) ─rot(head)┘
//! ```
//!
//! Heading slices are independent and computed in parallel.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::{GridPose, GridShape};
use crate::error::{LocalizationError, Result};
use crate::map::OccupancyMap;
use crate::sensor::{RangeScan, ReferenceScanTable, ScanImageStack, heading_ray_offset};

use super::field::LikelihoodField;
use super::normalize::Normalization;
use super::similarity::Similarity;

/// Low-res cells above this are masked when `mask_with_map` is set
const MASK_THRESHOLD: f32 = 0.5;

/// Where the per-step likelihood comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikelihoodSource {
    /// Reference-table similarity against the live scan
    #[default]
    GroundTruth,
    /// External [`LikelihoodProvider`]
    Provider,
    /// Flat field; only motion changes the belief
    Uniform,
}

/// Learned (or otherwise external) observation model.
///
/// Implementations receive the map and one scan image per heading and
/// return a field of the belief's shape. The engine normalizes the result
/// before fusing.
pub trait LikelihoodProvider {
    /// Predict a likelihood field
    fn predict(&self, map: &OccupancyMap, scans: &ScanImageStack) -> Result<LikelihoodField>;
}

/// Provider returning a flat field; fusing it leaves the belief unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformProvider {
    /// Number of headings of the produced field
    pub headings: usize,
}

impl LikelihoodProvider for UniformProvider {
    fn predict(&self, map: &OccupancyMap, _scans: &ScanImageStack) -> Result<LikelihoodField> {
        let (rows, cols) = map.grid_dims();
        Ok(LikelihoodField::uniform(GridShape::new(
            self.headings,
            rows,
            cols,
        )))
    }
}

/// Builder settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LikelihoodConfig {
    /// Discrete headings (D)
    pub headings: usize,
    /// Scan similarity metric
    pub similarity: Similarity,
    /// Score normalization
    pub normalization: Normalization,
    /// Cells whose centre collides at this radius are zeroed (meters)
    pub occupied_radius: f64,
    /// Zero cells whose low-res occupancy exceeds 0.5 after normalizing
    pub mask_with_map: bool,
}

impl Default for LikelihoodConfig {
    fn default() -> Self {
        Self {
            headings: 4,
            similarity: Similarity::Cosine,
            normalization: Normalization::default(),
            occupied_radius: 0.05,
            mask_with_map: false,
        }
    }
}

/// Builds ground-truth likelihood fields.
#[derive(Clone, Debug)]
pub struct LikelihoodBuilder {
    config: LikelihoodConfig,
}

impl LikelihoodBuilder {
    /// Create a builder
    pub fn new(config: LikelihoodConfig) -> Self {
        Self { config }
    }

    /// Builder settings
    pub fn config(&self) -> &LikelihoodConfig {
        &self.config
    }

    /// Normalized likelihood for a live scan.
    ///
    /// Every input is required; a missing one is a configuration error.
    pub fn compute(
        &self,
        map: Option<&OccupancyMap>,
        table: Option<&ReferenceScanTable>,
        live: Option<&RangeScan>,
    ) -> Result<LikelihoodField> {
        let map = map.ok_or_else(|| LocalizationError::config("likelihood needs a map"))?;
        let table =
            table.ok_or_else(|| LocalizationError::config("likelihood needs a reference table"))?;
        let live = live.ok_or_else(|| LocalizationError::config("likelihood needs a live scan"))?;

        if table.map_id() != map.id() {
            return Err(LocalizationError::config(format!(
                "reference table belongs to map {:016x}, not {:016x}",
                table.map_id(),
                map.id()
            )));
        }
        if map.grid_dims() != (table.rows(), table.cols()) {
            return Err(LocalizationError::config("reference table does not match grid"));
        }

        let blocked = map.blocked_cells(self.config.occupied_radius);
        let mut field = self.similarity_field(table, live, &blocked)?;
        field.normalize(self.config.normalization)?;

        if self.config.mask_with_map {
            let mask: Vec<bool> = map.low_res().iter().map(|&v| v > MASK_THRESHOLD).collect();
            field.zero_cells(&mask);
            field.normalize_sum()?;
        }
        Ok(field)
    }

    /// Raw similarity field, `0` at blocked cells, not normalized.
    pub fn similarity_field(
        &self,
        table: &ReferenceScanTable,
        live: &RangeScan,
        blocked: &[bool],
    ) -> Result<LikelihoodField> {
        let headings = self.config.headings;
        if headings == 0 {
            return Err(LocalizationError::config("zero headings"));
        }
        if live.len() != table.rays() {
            return Err(LocalizationError::config(format!(
                "live scan has {} rays, reference table {}",
                live.len(),
                table.rays()
            )));
        }
        let (rows, cols) = (table.rows(), table.cols());
        if blocked.len() != rows * cols {
            return Err(LocalizationError::config("occupied mask does not match grid"));
        }
        let shape = GridShape::new(headings, rows, cols);
        let (min, max) = table.range_bounds();
        let live = live.clamped(min, max);
        let similarity = self.config.similarity;
        let rays = table.rays();

        let mut data = vec![0.0f64; shape.len()];
        data.par_chunks_mut(shape.slice_len())
            .enumerate()
            .try_for_each(|(head, slice)| -> Result<()> {
                let offset = heading_ray_offset(head, headings, rays);
                let mut rotated = vec![0.0f64; rays];
                for (cell, out) in slice.iter_mut().enumerate() {
                    if blocked[cell] {
                        continue;
                    }
                    let reference = table.scan(cell / cols, cell % cols);
                    for (k, r) in rotated.iter_mut().enumerate() {
                        *r = reference[(k + offset) % rays];
                    }
                    *out = similarity.score(&rotated, live.ranges())?;
                }
                Ok(())
            })?;

        let field = LikelihoodField::from_raw(shape, data);
        if log::log_enabled!(log::Level::Debug) {
            let best = field
                .data()
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
            let pose: GridPose = shape.unravel(best.0);
            debug!("[Likelihood] best similarity {:.4} at {:?}", best.1, pose);
        }
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GridLimits;
    use crate::sensor::{BuildOptions, CancelToken, NoiseGenerator, ScanOptions, cast_scan};

    /// 60x60 px over 3 m with an L-shaped wall, 3x3 grid
    fn asymmetric_map() -> OccupancyMap {
        let n = 60;
        let mut cells = vec![0.0; n * n];
        for i in 0..n {
            cells[i] = 1.0; // x = -1.5 edge
            cells[i * n] = 1.0; // y = -1.5 edge
            cells[(n - 1) * n + i] = 1.0;
            cells[i * n + n - 1] = 1.0;
        }
        // Interior wall stub near the +X/+Y corner
        for r in 40..44 {
            for c in 40..55 {
                cells[r * n + c] = 1.0;
            }
        }
        let lim = GridLimits::new(-1.5, 1.5);
        OccupancyMap::from_cells(n, n, lim, lim, cells, 3, 3).unwrap()
    }

    fn options() -> ScanOptions {
        ScanOptions {
            max_range: 3.0,
            step_jitter: 0.0,
            ..ScanOptions::default()
        }
    }

    fn table(map: &OccupancyMap) -> ReferenceScanTable {
        ReferenceScanTable::build(map, &options(), BuildOptions::default(), &CancelToken::new())
            .unwrap()
    }

    #[test]
    fn test_missing_inputs_are_config_errors() {
        let map = asymmetric_map();
        let table = table(&map);
        let scan = RangeScan::new(vec![1.0; 360]);
        let builder = LikelihoodBuilder::new(LikelihoodConfig::default());
        for result in [
            builder.compute(None, Some(&table), Some(&scan)),
            builder.compute(Some(&map), None, Some(&scan)),
            builder.compute(Some(&map), Some(&table), None),
        ] {
            assert!(matches!(result, Err(LocalizationError::Configuration(_))));
        }
    }

    #[test]
    fn test_true_pose_scores_highest() {
        let map = asymmetric_map();
        let table = table(&map);
        let geometry = map.geometry(4);
        let truth = GridPose::new(1, 0, 1);
        let pose = geometry.cell_pose(truth);
        let mut noise = NoiseGenerator::new(1);
        let live = cast_scan(&pose, &map, &options(), &mut noise);

        let builder = LikelihoodBuilder::new(LikelihoodConfig::default());
        let field = builder.compute(Some(&map), Some(&table), Some(&live)).unwrap();
        assert!((field.sum() - 1.0).abs() < 1e-9);

        let best = (0..field.data().len())
            .max_by(|&a, &b| field.data()[a].total_cmp(&field.data()[b]))
            .unwrap();
        assert_eq!(geometry.shape.unravel(best), truth);
    }

    #[test]
    fn test_blocked_cells_are_zero() {
        let map = asymmetric_map();
        let table = table(&map);
        let live = RangeScan::new(table.scan(0, 0).to_vec());
        let mut blocked = vec![false; 9];
        blocked[4] = true;
        let builder = LikelihoodBuilder::new(LikelihoodConfig::default());
        let raw = builder.similarity_field(&table, &live, &blocked).unwrap();
        for head in 0..4 {
            assert_eq!(raw.get(GridPose::new(head, 1, 1)), 0.0);
            assert!(raw.get(GridPose::new(head, 0, 0)) > 0.0);
        }
    }

    #[test]
    fn test_ray_count_mismatch() {
        let map = asymmetric_map();
        let table = table(&map);
        let live = RangeScan::new(vec![1.0; 90]);
        let builder = LikelihoodBuilder::new(LikelihoodConfig::default());
        assert!(builder.compute(Some(&map), Some(&table), Some(&live)).is_err());
    }

    #[test]
    fn test_uniform_provider() {
        let map = asymmetric_map();
        let stack = ScanImageStack::render(
            &RangeScan::new(vec![1.0; 360]),
            4,
            60,
            60,
            map.x_limits(),
            map.y_limits(),
        );
        let field = UniformProvider { headings: 4 }.predict(&map, &stack).unwrap();
        assert_eq!(field.shape(), GridShape::new(4, 3, 3));
        assert!((field.sum() - 1.0).abs() < 1e-12);
    }
}
