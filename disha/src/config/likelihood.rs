//! Likelihood configuration section.

use serde::{Deserialize, Serialize};

use crate::likelihood::{LikelihoodConfig, LikelihoodSource, Normalization, Similarity};

use super::defaults;

/// Normalization policy name
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationKind {
    /// Softmax with `temperature`
    #[default]
    Softmax,
    /// Log-shifted scores
    Softermax,
    /// Clipped linear scaling
    Linear,
}

/// Likelihood settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LikelihoodSection {
    /// Field fused each step
    #[serde(default)]
    pub source: LikelihoodSource,

    /// Scan similarity metric
    #[serde(default)]
    pub similarity: Similarity,

    /// Score normalization
    #[serde(default)]
    pub normalization: NormalizationKind,

    /// Softmax temperature
    #[serde(default = "defaults::temperature")]
    pub temperature: f64,

    /// Zero cells whose centre is this close to an obstacle (meters)
    #[serde(default = "defaults::occupied_radius")]
    pub occupied_radius: f64,

    /// Zero cells occupied in the low-res grid
    #[serde(default)]
    pub mask_with_map: bool,
}

impl Default for LikelihoodSection {
    fn default() -> Self {
        Self {
            source: LikelihoodSource::GroundTruth,
            similarity: Similarity::Cosine,
            normalization: NormalizationKind::Softmax,
            temperature: 1.0,
            occupied_radius: 0.05,
            mask_with_map: false,
        }
    }
}

impl LikelihoodSection {
    /// Normalization policy with its parameters
    pub fn normalization(&self) -> Normalization {
        match self.normalization {
            NormalizationKind::Softmax => Normalization::Softmax {
                temperature: self.temperature,
            },
            NormalizationKind::Softermax => Normalization::Softermax,
            NormalizationKind::Linear => Normalization::Linear,
        }
    }

    /// Convert to builder settings for `headings` heading bins
    pub fn to_likelihood_config(&self, headings: usize) -> LikelihoodConfig {
        LikelihoodConfig {
            headings,
            similarity: self.similarity,
            normalization: self.normalization(),
            occupied_radius: self.occupied_radius,
            mask_with_map: self.mask_with_map,
        }
    }
}
