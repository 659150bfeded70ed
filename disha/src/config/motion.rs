//! Motion configuration section.

use serde::{Deserialize, Serialize};

use crate::filter::{MotionModelKind, TransitionConfig};

use super::defaults;

/// Motion model and executor settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionSection {
    /// Transition model
    #[serde(default)]
    pub model: MotionModelKind,

    /// Grid cells per forward step
    #[serde(default = "defaults::one")]
    pub forward_step: usize,

    /// Heading bins per turn
    #[serde(default = "defaults::one")]
    pub rotation_step: usize,

    /// Belief diffusion σ (cells)
    #[serde(default = "defaults::sigma_xy")]
    pub sigma_xy: f64,

    /// Fraction leaked to each neighbouring heading ring
    #[serde(default = "defaults::heading_leak")]
    pub heading_leak: f64,

    /// Heading rings receiving leak
    #[serde(default = "defaults::one")]
    pub leak_rings: usize,

    /// Executor position noise σ (meters)
    #[serde(default)]
    pub process_noise_xy: f64,

    /// Executor heading noise σ (radians)
    #[serde(default)]
    pub process_noise_theta: f64,

    /// Robot radius (meters)
    #[serde(default = "defaults::collision_radius")]
    pub collision_radius: f64,
}

impl Default for MotionSection {
    fn default() -> Self {
        Self {
            model: MotionModelKind::StochasticShift,
            forward_step: 1,
            rotation_step: 1,
            sigma_xy: 0.5,
            heading_leak: 0.2,
            leak_rings: 1,
            process_noise_xy: 0.0,
            process_noise_theta: 0.0,
            collision_radius: 0.25,
        }
    }
}

impl MotionSection {
    /// Convert to the belief transition settings
    pub fn to_transition_config(&self) -> TransitionConfig {
        TransitionConfig {
            model: self.model,
            rotation_step: self.rotation_step,
            forward_step: self.forward_step,
            sigma_xy: self.sigma_xy,
            heading_leak: self.heading_leak,
            leak_rings: self.leak_rings,
        }
    }
}
