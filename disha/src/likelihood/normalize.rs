//! Normalization policies turning similarity scores into probabilities.
//!
//! | Policy | Transform |
//! |--------|-----------|
//! | Softmax | `exp(w/T) / Σ exp(w/T)` |
//! | Softermax | `ln(w − min(w) + e) / Σ` |
//! | Linear | `clip(w, 1e-5, 1) / Σ` |

use std::f64::consts::E;

use crate::error::{LocalizationError, Result};

/// Lower clip of the linear policy
const LINEAR_FLOOR: f64 = 1e-5;

/// Score normalization policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Normalization {
    /// Softmax with temperature
    Softmax {
        /// Temperature `T > 0`
        temperature: f64,
    },
    /// Log of positively shifted scores, heavier tailed than softmax
    Softermax,
    /// Clipped linear scaling
    Linear,
}

impl Default for Normalization {
    fn default() -> Self {
        Normalization::Softmax { temperature: 1.0 }
    }
}

impl Normalization {
    /// Normalize `values` in place to sum 1.
    pub fn apply(&self, values: &mut [f64]) -> Result<()> {
        if values.is_empty() {
            return Err(LocalizationError::config("cannot normalize an empty field"));
        }
        match *self {
            Normalization::Softmax { temperature } => {
                if !(temperature > 0.0) {
                    return Err(LocalizationError::config(format!(
                        "softmax temperature must be positive, got {}",
                        temperature
                    )));
                }
                let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                values
                    .iter_mut()
                    .for_each(|v| *v = ((*v - max) / temperature).exp());
            }
            Normalization::Softermax => {
                let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
                values.iter_mut().for_each(|v| *v = (*v - min + E).ln());
            }
            Normalization::Linear => {
                values
                    .iter_mut()
                    .for_each(|v| *v = v.clamp(LINEAR_FLOOR, 1.0));
            }
        }

        let total: f64 = values.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            return Err(LocalizationError::numerical(format!(
                "normalization produced mass {}",
                total
            )));
        }
        values.iter_mut().for_each(|v| *v /= total);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sum(v: &[f64]) -> f64 {
        v.iter().sum()
    }

    #[test]
    fn test_softmax_matches_formula() {
        let mut v = vec![0.0, 1.0, 2.0];
        Normalization::Softmax { temperature: 1.0 }.apply(&mut v).unwrap();
        let z = 1.0 + E + E * E;
        assert_relative_eq!(v[0], 1.0 / z, epsilon = 1e-12);
        assert_relative_eq!(v[2], E * E / z, epsilon = 1e-12);
    }

    #[test]
    fn test_softmax_temperature_flattens() {
        let mut sharp = vec![0.0, 1.0];
        let mut flat = vec![0.0, 1.0];
        Normalization::Softmax { temperature: 0.1 }.apply(&mut sharp).unwrap();
        Normalization::Softmax { temperature: 10.0 }.apply(&mut flat).unwrap();
        assert!(sharp[1] > flat[1]);
        assert!(Normalization::Softmax { temperature: 0.0 }.apply(&mut vec![1.0]).is_err());
    }

    #[test]
    fn test_softermax() {
        let mut v = vec![-1.0, 0.0, 1.0];
        Normalization::Softermax.apply(&mut v).unwrap();
        assert_relative_eq!(sum(&v), 1.0, epsilon = 1e-12);
        // Minimum maps to ln(e) = 1 before normalization
        let z = 1.0 + (1.0 + E).ln() + (2.0 + E).ln();
        assert_relative_eq!(v[0], 1.0 / z, epsilon = 1e-12);
    }

    #[test]
    fn test_linear_clips() {
        let mut v = vec![0.0, 0.5, 2.0];
        Normalization::Linear.apply(&mut v).unwrap();
        let z = LINEAR_FLOOR + 0.5 + 1.0;
        assert_relative_eq!(v[0], LINEAR_FLOOR / z, epsilon = 1e-12);
        assert_relative_eq!(v[2], 1.0 / z, epsilon = 1e-12);
    }
}
