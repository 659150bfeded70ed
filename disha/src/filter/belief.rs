//! Belief over grid poses.
//!
//! ## Invariants
//!
//! - `|Σ p − 1| < 1e-6` after every mutation
//! - `p ≥ 0` everywhere
//! - entropy terms use `max(p, ENTROPY_FLOOR)` so `log 0` never occurs
//!
//! ## Step order
//!
//! ```text
//!   transition(action) ─► fuse(likelihood) ─► normalize ─► map_estimate
//! ```
//!
//! A zero total mass after fusion is reported, never papered over with a
//! uniform reset.

use std::sync::Arc;

use crate::core::{GridPose, GridShape};
use crate::error::{LocalizationError, Result};
use crate::likelihood::LikelihoodField;

/// Floor applied before taking logarithms
pub const ENTROPY_FLOOR: f64 = 1e-12;

/// Read-only belief published after each full step
pub type BeliefSnapshot = Arc<Belief>;

/// Probability mass function over `D × R × C` grid poses.
#[derive(Clone, Debug, PartialEq)]
pub struct Belief {
    shape: GridShape,
    data: Vec<f64>,
}

impl Belief {
    /// Uniform belief
    pub fn uniform(shape: GridShape) -> Self {
        let n = shape.len().max(1);
        Self {
            shape,
            data: vec![1.0 / n as f64; shape.len()],
        }
    }

    /// Belief from raw non-negative weights, normalized
    pub fn from_weights(shape: GridShape, data: Vec<f64>) -> Result<Self> {
        if data.len() != shape.len() {
            return Err(LocalizationError::config(format!(
                "belief expects {} entries, got {}",
                shape.len(),
                data.len()
            )));
        }
        if data.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(LocalizationError::numerical(
                "belief weights must be finite and non-negative",
            ));
        }
        let mut belief = Self { shape, data };
        belief.normalize()?;
        Ok(belief)
    }

    /// Tensor shape
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Probabilities, head-major
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Probability of one pose
    pub fn get(&self, pose: GridPose) -> f64 {
        self.data[self.shape.index(pose)]
    }

    /// Total mass
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Smallest entry
    pub fn min(&self) -> f64 {
        self.data.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    /// Reset to uniform
    pub fn reset(&mut self) {
        let n = self.shape.len().max(1);
        self.data.iter_mut().for_each(|v| *v = 1.0 / n as f64);
    }

    /// Elementwise product with `likelihood`, then normalize.
    pub fn fuse(&mut self, likelihood: &LikelihoodField) -> Result<()> {
        if likelihood.shape() != self.shape {
            return Err(LocalizationError::config(format!(
                "likelihood shape {:?} does not match belief {:?}",
                likelihood.shape(),
                self.shape
            )));
        }
        // Check the fused mass before touching the belief
        let total: f64 = self
            .data
            .iter()
            .zip(likelihood.data())
            .map(|(p, l)| p * l)
            .sum();
        check_mass(total)?;
        for (p, l) in self.data.iter_mut().zip(likelihood.data()) {
            *p = *p * l / total;
        }
        Ok(())
    }

    /// Divide by total mass; zero or non-finite mass is a numerical error.
    pub fn normalize(&mut self) -> Result<()> {
        let total = self.sum();
        check_mass(total)?;
        self.data.iter_mut().for_each(|p| *p /= total);
        Ok(())
    }

    /// Most probable pose; ties go to the lowest flattened index.
    pub fn map_estimate(&self) -> GridPose {
        let mut best = 0;
        for (i, &p) in self.data.iter().enumerate() {
            if p > self.data[best] {
                best = i;
            }
        }
        self.shape.unravel(best)
    }

    /// `Σ p · ln p` (≤ 0)
    pub fn negentropy(&self) -> f64 {
        self.data
            .iter()
            .map(|&p| {
                let q = p.max(ENTROPY_FLOOR);
                q * q.ln()
            })
            .sum()
    }

    /// Shannon entropy `−Σ p · ln p` in nats (≥ 0)
    pub fn entropy(&self) -> f64 {
        -self.negentropy()
    }
}

fn check_mass(total: f64) -> Result<()> {
    if total == 0.0 || !total.is_finite() {
        return Err(LocalizationError::numerical(format!(
            "belief mass collapsed to {}",
            total
        )));
    }
    Ok(())
}
