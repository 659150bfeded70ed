//! Likelihood tensor over grid poses.

use crate::core::{GridPose, GridShape};
use crate::error::{LocalizationError, Result};

use super::normalize::Normalization;

/// Non-negative `D × R × C` field, head-major.
#[derive(Clone, Debug, PartialEq)]
pub struct LikelihoodField {
    shape: GridShape,
    data: Vec<f64>,
}

impl LikelihoodField {
    /// Wrap raw values; rejects wrong length, negative or non-finite entries
    pub fn from_vec(shape: GridShape, data: Vec<f64>) -> Result<Self> {
        if data.len() != shape.len() {
            return Err(LocalizationError::config(format!(
                "likelihood expects {} entries, got {}",
                shape.len(),
                data.len()
            )));
        }
        if let Some(bad) = data.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(LocalizationError::numerical(format!(
                "likelihood entry {} is negative or not finite",
                bad
            )));
        }
        Ok(Self { shape, data })
    }

    /// Constant field summing to 1
    pub fn uniform(shape: GridShape) -> Self {
        let n = shape.len().max(1);
        Self {
            shape,
            data: vec![1.0 / n as f64; shape.len()],
        }
    }

    /// `baseline` everywhere except `peak` at one pose, then sum-normalized
    pub fn peaked(shape: GridShape, at: GridPose, peak: f64, baseline: f64) -> Result<Self> {
        let mut data = vec![baseline; shape.len()];
        if !shape.contains(at) {
            return Err(LocalizationError::config("peak pose outside grid"));
        }
        data[shape.index(at)] = peak;
        let mut field = Self::from_vec(shape, data)?;
        field.normalize_sum()?;
        Ok(field)
    }

    pub(crate) fn from_raw(shape: GridShape, data: Vec<f64>) -> Self {
        Self { shape, data }
    }

    /// Tensor shape
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Values, head-major
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable values
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Value at one pose
    pub fn get(&self, pose: GridPose) -> f64 {
        self.data[self.shape.index(pose)]
    }

    /// Total mass
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Apply a normalization policy in place
    pub fn normalize(&mut self, mode: Normalization) -> Result<()> {
        mode.apply(&mut self.data)
    }

    /// Divide by total mass
    pub fn normalize_sum(&mut self) -> Result<()> {
        let total = self.sum();
        if !(total > 0.0 && total.is_finite()) {
            return Err(LocalizationError::numerical(format!(
                "likelihood mass is {}",
                total
            )));
        }
        self.data.iter_mut().for_each(|v| *v /= total);
        Ok(())
    }

    /// Zero every spatial cell whose `mask` flag is set, in every heading
    pub fn zero_cells(&mut self, mask: &[bool]) {
        let slice = self.shape.slice_len();
        for chunk in self.data.chunks_mut(slice) {
            for (v, &m) in chunk.iter_mut().zip(mask) {
                if m {
                    *v = 0.0;
                }
            }
        }
    }
}
