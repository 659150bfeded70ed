//! Synthetic range sensor.
//!
//! Each ray is marched outward from `min_range` in jittered steps until
//! the occupancy field reaches [`OCCUPIED_THRESHOLD`]:
//!
//! ```text
//! pose ●··○··○·○··○··■  hit → distance
//!      min  step ∈ [step, step + jitter)
//!
//! pose ●··○··○·○··○··○·· max_range / map edge → +inf
//! ```
//!
//! After marching, optional degradations apply:
//!
//! | Option | Effect |
//! |--------|--------|
//! | `fov` | rays strictly inside the sector (degrees) become NaN |
//! | `scan_step` | only every n-th ray is cast, the rest are NaN |
//! | `missing_rays` | that many random rays are forced to `+inf` |
//! | `range_noise` | additive Gaussian noise (σ, meters) |

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::core::Pose;
use crate::error::{LocalizationError, Result};
use crate::map::{OCCUPIED_THRESHOLD, OccupancyMap};

use super::noise::NoiseGenerator;
use super::scan::RangeScan;

/// Ray casting parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Range where marching starts (meters)
    pub min_range: f64,
    /// Range beyond which a ray reports no hit (meters)
    pub max_range: f64,
    /// Rays per revolution
    pub rays: usize,
    /// Minimum march step (meters)
    pub step: f64,
    /// Random extra step length, uniform in `[0, step_jitter)`
    pub step_jitter: f64,
    /// Blocked sector `(from, to)` in degrees, exclusive
    pub fov: Option<(f64, f64)>,
    /// Cast every n-th ray only
    pub scan_step: usize,
    /// Rays forced to `+inf`
    pub missing_rays: usize,
    /// Additive range noise σ (meters)
    pub range_noise: f64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            min_range: 0.10,
            max_range: 3.5,
            rays: 360,
            step: 0.01,
            step_jitter: 0.01,
            fov: None,
            scan_step: 1,
            missing_rays: 0,
            range_noise: 0.0,
        }
    }
}

impl ScanOptions {
    /// Same geometry with every degradation switched off
    pub fn noiseless(&self) -> Self {
        Self {
            fov: None,
            scan_step: 1,
            missing_rays: 0,
            range_noise: 0.0,
            ..self.clone()
        }
    }

    /// Reject geometry the ray marcher cannot use.
    ///
    /// Requires `0 ≤ min_range < max_range`, at least one ray and a
    /// positive march step.
    pub fn validate(&self) -> Result<()> {
        if self.rays == 0 {
            return Err(LocalizationError::config("scan has zero rays"));
        }
        if !(self.min_range.is_finite() && self.max_range.is_finite())
            || self.min_range < 0.0
            || self.min_range >= self.max_range
        {
            return Err(LocalizationError::config(format!(
                "invalid range bounds [{}, {}]",
                self.min_range, self.max_range
            )));
        }
        if !self.step.is_finite() || self.step <= 0.0 || !(self.step_jitter >= 0.0) {
            return Err(LocalizationError::config(format!(
                "invalid march step {} (+{} jitter)",
                self.step, self.step_jitter
            )));
        }
        Ok(())
    }

    /// Whether ray `i` falls inside the blocked sector
    #[inline]
    pub fn is_masked(&self, i: usize) -> bool {
        match self.fov {
            Some((from, to)) => {
                let deg = i as f64 * 360.0 / self.rays as f64;
                deg > from && deg < to
            }
            None => false,
        }
    }
}

/// March a single ray from (x, y) along `angle`.
///
/// Returns the first distance whose probe lands on an occupied pixel, or
/// `+inf` if the ray passes `max_range` or leaves the map.
pub fn march_ray(
    map: &OccupancyMap,
    x: f64,
    y: f64,
    angle: f64,
    options: &ScanOptions,
    noise: &mut NoiseGenerator,
) -> f64 {
    let (cos_a, sin_a) = (angle.cos(), angle.sin());
    let step = options.step.max(1e-4);
    let mut dist = options.min_range;
    loop {
        if dist >= options.max_range {
            return f64::INFINITY;
        }
        match map.occupancy_at(x + dist * cos_a, y + dist * sin_a) {
            None => return f64::INFINITY,
            Some(v) if v >= OCCUPIED_THRESHOLD => return dist,
            Some(_) => {}
        }
        dist += step
            + if options.step_jitter > 0.0 {
                options.step_jitter * noise.uniform()
            } else {
                0.0
            };
    }
}

/// Cast a full scan from `pose` against `map`.
pub fn cast_scan(
    pose: &Pose,
    map: &OccupancyMap,
    options: &ScanOptions,
    noise: &mut NoiseGenerator,
) -> RangeScan {
    let rays = options.rays;
    let missing = if options.missing_rays > 0 {
        let mut flags = vec![false; rays];
        for i in noise.distinct_indices(rays, options.missing_rays) {
            flags[i] = true;
        }
        flags
    } else {
        Vec::new()
    };
    let scan_step = options.scan_step.max(1);

    let mut ranges = vec![f64::NAN; rays];
    for (i, range) in ranges.iter_mut().enumerate() {
        if i % scan_step != 0 || options.is_masked(i) {
            continue;
        }
        let dist = if missing.get(i).copied().unwrap_or(false) {
            f64::INFINITY
        } else {
            let angle = pose.theta + i as f64 * TAU / rays as f64;
            march_ray(map, pose.x, pose.y, angle, options, noise)
        };
        *range = dist + noise.gaussian(options.range_noise);
    }

    RangeScan::new(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GridLimits;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn limits() -> GridLimits {
        GridLimits::new(-2.0, 2.0)
    }

    /// 80x80 pixels of 0.05 m, a 2x2 pixel block whose corner is at (x, y)
    fn map_with_obstacle(x: f64, y: f64) -> OccupancyMap {
        let n = 80;
        let mut cells = vec![0.0; n * n];
        let r = crate::core::to_index(x, n, limits()) as usize;
        let c = crate::core::to_index(y, n, limits()) as usize;
        for (dr, dc) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            cells[(r + dr - 1) * n + c + dc - 1] = 1.0;
        }
        OccupancyMap::from_cells(n, n, limits(), limits(), cells, 4, 4).unwrap()
    }

    #[test]
    fn test_empty_map_no_hits() {
        let map = OccupancyMap::empty(80, 80, limits(), limits(), 4, 4).unwrap();
        let options = ScanOptions {
            max_range: 1.5,
            ..ScanOptions::default()
        };
        let mut noise = NoiseGenerator::new(1);
        let scan = cast_scan(&Pose::new(0.0, 0.0, 0.0), &map, &options, &mut noise);
        assert_eq!(scan.len(), 360);
        assert!(scan.ranges().iter().all(|r| r.is_infinite()));
    }

    #[test]
    fn test_obstacle_ahead() {
        let map = map_with_obstacle(1.0, 0.0);
        let mut noise = NoiseGenerator::new(2);
        let scan = cast_scan(&Pose::new(0.0, 0.0, 0.0), &map, &ScanOptions::default(), &mut noise);
        let ahead = scan.ranges()[0];
        assert!(ahead.is_finite());
        assert!((0.95..0.975).contains(&ahead), "ahead = {}", ahead);
        assert!(scan.ranges()[180].is_infinite());
    }

    #[test]
    fn test_heading_offsets_rays() {
        let map = map_with_obstacle(0.0, 1.0);
        let mut noise = NoiseGenerator::new(3);
        // Facing +Y: the obstacle is straight ahead
        let scan = cast_scan(&Pose::new(FRAC_PI_2, 0.0, 0.0), &map, &ScanOptions::default(), &mut noise);
        assert!(scan.ranges()[0].is_finite());
        // Facing -X: the obstacle is on the right (ray 270)
        let scan = cast_scan(&Pose::new(PI, 0.0, 0.0), &map, &ScanOptions::default(), &mut noise);
        assert!(scan.ranges()[270].is_finite());
    }

    #[test]
    fn test_fov_and_missing_rays() {
        let map = map_with_obstacle(1.0, 0.0);
        let options = ScanOptions {
            fov: Some((90.0, 270.0)),
            missing_rays: 10,
            ..ScanOptions::default()
        };
        let mut noise = NoiseGenerator::new(4);
        let scan = cast_scan(&Pose::new(0.0, 0.0, 0.0), &map, &options, &mut noise);
        assert!(scan.ranges()[180].is_nan());
        assert!(scan.ranges()[91].is_nan());
        assert!(!scan.ranges()[90].is_nan());
        assert_eq!(scan.valid_count(), 360 - 179);
    }

    #[test]
    fn test_scan_step_subsamples() {
        let map = map_with_obstacle(1.0, 0.0);
        let options = ScanOptions {
            scan_step: 4,
            ..ScanOptions::default()
        };
        let mut noise = NoiseGenerator::new(5);
        let scan = cast_scan(&Pose::new(0.0, 0.0, 0.0), &map, &options, &mut noise);
        assert_eq!(scan.valid_count(), 90);
        assert!(scan.ranges()[1].is_nan());
    }

    #[test]
    fn test_ray_leaving_map() {
        let map = OccupancyMap::empty(80, 80, limits(), limits(), 4, 4).unwrap();
        let mut noise = NoiseGenerator::new(6);
        // Max range exceeds the distance to the edge
        let options = ScanOptions {
            max_range: 10.0,
            ..ScanOptions::default()
        };
        let d = march_ray(&map, 1.9, 0.0, 0.0, &options, &mut noise);
        assert!(d.is_infinite());
    }
}
