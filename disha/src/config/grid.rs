//! Grid configuration section.

use serde::{Deserialize, Serialize};

use crate::core::GridLimits;
use crate::map::FieldSpec;

use super::defaults;
use super::error::ConfigLoadError;

/// Grid configuration section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSection {
    /// Discrete headings (D)
    #[serde(default = "defaults::headings")]
    pub headings: usize,

    /// Belief grid rows (R, along X)
    #[serde(default = "defaults::grid_cells")]
    pub rows: usize,

    /// Belief grid columns (C, along Y)
    #[serde(default = "defaults::grid_cells")]
    pub cols: usize,

    /// X extent `[lo, hi)` (meters)
    #[serde(default = "defaults::limits")]
    pub x_limits: [f64; 2],

    /// Y extent `[lo, hi)` (meters)
    #[serde(default = "defaults::limits")]
    pub y_limits: [f64; 2],

    /// High-res map rows
    #[serde(default = "defaults::map_pixels")]
    pub map_rows: usize,

    /// High-res map columns
    #[serde(default = "defaults::map_pixels")]
    pub map_cols: usize,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            headings: 4,
            rows: 11,
            cols: 11,
            x_limits: [-3.0, 3.0],
            y_limits: [-3.0, 3.0],
            map_rows: 224,
            map_cols: 224,
        }
    }
}

impl GridSection {
    /// X limits
    pub fn x_limits(&self) -> GridLimits {
        GridLimits::new(self.x_limits[0], self.x_limits[1])
    }

    /// Y limits
    pub fn y_limits(&self) -> GridLimits {
        GridLimits::new(self.y_limits[0], self.y_limits[1])
    }

    /// Reject zero sizes and empty limits
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let sizes = [
            ("headings", self.headings),
            ("rows", self.rows),
            ("cols", self.cols),
            ("map_rows", self.map_rows),
            ("map_cols", self.map_cols),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigLoadError::Invalid(format!("grid.{} is zero", name)));
        }
        if !self.x_limits().is_valid() || !self.y_limits().is_valid() {
            return Err(ConfigLoadError::Invalid(format!(
                "empty grid limits x {:?}, y {:?}",
                self.x_limits, self.y_limits
            )));
        }
        if self.map_rows < self.rows || self.map_cols < self.cols {
            return Err(ConfigLoadError::Invalid(
                "map resolution is coarser than the belief grid".to_string(),
            ));
        }
        Ok(())
    }

    /// Convert to the map field description
    pub fn to_field_spec(&self) -> FieldSpec {
        FieldSpec {
            rows: self.map_rows,
            cols: self.map_cols,
            x_limits: self.x_limits(),
            y_limits: self.y_limits(),
            grid_rows: self.rows,
            grid_cols: self.cols,
        }
    }

    /// Cell extent along X (meters)
    pub fn cell_size_x(&self) -> f64 {
        self.x_limits().cell_size(self.rows)
    }
}
