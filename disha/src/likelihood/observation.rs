//! Likelihood dispatch over the configured source.

use crate::core::GridShape;
use crate::error::{LocalizationError, Result};
use crate::map::OccupancyMap;
use crate::sensor::{RangeScan, ReferenceScanTable, ScanImageStack};

use super::builder::{LikelihoodBuilder, LikelihoodProvider, LikelihoodSource};
use super::field::LikelihoodField;

/// Everything needed to turn a scan into a likelihood field.
#[derive(Clone, Copy)]
pub struct Observation<'a> {
    /// Current map
    pub map: &'a OccupancyMap,
    /// Reference scans of `map`
    pub table: &'a ReferenceScanTable,
    /// Selected source
    pub source: LikelihoodSource,
    /// Required when `source` is `Provider`
    pub provider: Option<&'a dyn LikelihoodProvider>,
}

impl<'a> Observation<'a> {
    /// Observation over the ground-truth source.
    pub fn ground_truth(map: &'a OccupancyMap, table: &'a ReferenceScanTable) -> Self {
        Self {
            map,
            table,
            source: LikelihoodSource::GroundTruth,
            provider: None,
        }
    }

    /// Normalized likelihood of `scan`.
    pub fn likelihood(&self, builder: &LikelihoodBuilder, scan: &RangeScan) -> Result<LikelihoodField> {
        let (rows, cols) = self.map.grid_dims();
        let shape = GridShape::new(builder.config().headings, rows, cols);
        match self.source {
            LikelihoodSource::GroundTruth => {
                builder.compute(Some(self.map), Some(self.table), Some(scan))
            }
            LikelihoodSource::Uniform => Ok(LikelihoodField::uniform(shape)),
            LikelihoodSource::Provider => {
                let provider = self.provider.ok_or_else(|| {
                    LocalizationError::config("provider source selected but no provider given")
                })?;
                let stack = ScanImageStack::render(
                    scan,
                    shape.headings,
                    self.map.rows(),
                    self.map.cols(),
                    self.map.x_limits(),
                    self.map.y_limits(),
                );
                let mut field = provider.predict(self.map, &stack)?;
                if field.shape() != shape {
                    return Err(LocalizationError::config(format!(
                        "provider returned shape {:?}, expected {:?}",
                        field.shape(),
                        shape
                    )));
                }
                field.normalize_sum()?;
                Ok(field)
            }
        }
    }
}
