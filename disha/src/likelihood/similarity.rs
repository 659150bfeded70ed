//! Scan similarity metrics.
//!
//! Only paired entries where both scans are finite take part. A scan pair
//! with no such entry cannot be scored and is a numerical error.

use serde::{Deserialize, Serialize};

use crate::error::{LocalizationError, Result};

/// Similarity between a reference scan and a live scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    /// Dot product over both L2 norms
    #[default]
    Cosine,
    /// Pearson correlation clipped to [0, 1]
    CorrelationClip,
    /// Pearson correlation rescaled to `0.5 · (r + 1)`
    CorrelationRescale,
}

impl Similarity {
    /// Score two equally long scans.
    ///
    /// Zero norm or zero variance scores 0 (before rescaling).
    pub fn score(&self, x: &[f64], y: &[f64]) -> Result<f64> {
        let mut n = 0usize;
        let (mut sx, mut sy, mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (&a, &b) in x.iter().zip(y) {
            if !a.is_finite() || !b.is_finite() {
                continue;
            }
            n += 1;
            sx += a;
            sy += b;
            sxx += a * a;
            syy += b * b;
            sxy += a * b;
        }
        if n == 0 {
            return Err(LocalizationError::numerical(
                "similarity has no valid paired samples",
            ));
        }

        match self {
            Similarity::Cosine => {
                let denom = (sxx * syy).sqrt();
                Ok(if denom > 0.0 { sxy / denom } else { 0.0 })
            }
            Similarity::CorrelationClip | Similarity::CorrelationRescale => {
                let nf = n as f64;
                let cov = sxy - sx * sy / nf;
                let vx = sxx - sx * sx / nf;
                let vy = syy - sy * sy / nf;
                let denom = (vx * vy).sqrt();
                let r = if denom > 1e-12 {
                    (cov / denom).clamp(-1.0, 1.0)
                } else {
                    0.0
                };
                Ok(match self {
                    Similarity::CorrelationClip => r.clamp(0.0, 1.0),
                    _ => 0.5 * (r + 1.0),
                })
            }
        }
    }
}
