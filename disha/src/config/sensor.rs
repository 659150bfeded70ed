//! Sensor configuration section.

use serde::{Deserialize, Serialize};

use crate::sensor::ScanOptions;

use super::defaults;

/// Simulated lidar settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorSection {
    /// Minimum range (meters)
    #[serde(default = "defaults::min_range")]
    pub min_range: f64,

    /// Maximum range (meters)
    #[serde(default = "defaults::max_range")]
    pub max_range: f64,

    /// Rays per revolution
    #[serde(default = "defaults::rays")]
    pub rays: usize,

    /// Ray march step (meters)
    #[serde(default = "defaults::march_step")]
    pub step: f64,

    /// Random extra step length (meters)
    #[serde(default = "defaults::step_jitter")]
    pub step_jitter: f64,

    /// Blocked sector `[from, to]` in degrees; equal bounds disable it
    #[serde(default = "defaults::fov")]
    pub fov: [f64; 2],

    /// Rays forced to no-hit per scan
    #[serde(default)]
    pub missing_rays: usize,

    /// Additive range noise σ (meters)
    #[serde(default)]
    pub range_noise: f64,

    /// Cast every n-th ray only
    #[serde(default = "defaults::one")]
    pub scan_step: usize,
}

impl Default for SensorSection {
    fn default() -> Self {
        Self {
            min_range: 0.10,
            max_range: 3.5,
            rays: 360,
            step: 0.01,
            step_jitter: 0.01,
            fov: [0.0, 0.0],
            missing_rays: 0,
            range_noise: 0.0,
            scan_step: 1,
        }
    }
}

impl SensorSection {
    /// Convert to ray casting options
    pub fn to_scan_options(&self) -> ScanOptions {
        let fov = if self.fov[0] == self.fov[1] {
            None
        } else {
            Some((self.fov[0], self.fov[1]))
        };
        ScanOptions {
            min_range: self.min_range,
            max_range: self.max_range,
            rays: self.rays,
            step: self.step,
            step_jitter: self.step_jitter,
            fov,
            scan_step: self.scan_step.max(1),
            missing_rays: self.missing_rays,
            range_noise: self.range_noise,
        }
    }
}
