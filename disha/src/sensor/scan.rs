//! Range scan container.
//!
//! Ray `i` points at `i · 2π / rays` relative to the sensor heading.
//! Missing rays are NaN; rays with no hit are `+inf`.

use std::f64::consts::TAU;

/// One full-circle range scan.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeScan {
    ranges: Vec<f64>,
}

impl RangeScan {
    /// Wrap raw ranges
    pub fn new(ranges: Vec<f64>) -> Self {
        Self { ranges }
    }

    /// Raw ranges
    pub fn ranges(&self) -> &[f64] {
        &self.ranges
    }

    /// Number of rays
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True if the scan has no rays
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Angle of ray `i` relative to the sensor heading
    #[inline]
    pub fn ray_angle(&self, i: usize) -> f64 {
        i as f64 * TAU / self.ranges.len() as f64
    }

    /// Copy with every range clamped to `[min, max]`.
    ///
    /// `+inf` becomes `max`; NaN stays NaN so it is still excluded
    /// downstream. If `min > max`, `max` wins.
    pub fn clamped(&self, min: f64, max: f64) -> RangeScan {
        RangeScan::new(
            self.ranges
                .iter()
                .map(|&r| if r.is_nan() { r } else { r.max(min).min(max) })
                .collect(),
        )
    }

    /// Rays that are not NaN
    pub fn valid_count(&self) -> usize {
        self.ranges.iter().filter(|r| !r.is_nan()).count()
    }

    /// Copy rotated by `offset` rays: `out[k] = self[(k + offset) mod n]`.
    ///
    /// A scan taken at heading 0 rotated by the ray offset of heading `h`
    /// is the scan seen at heading `h` from the same position.
    pub fn rotated(&self, offset: usize) -> RangeScan {
        let n = self.ranges.len();
        if n == 0 {
            return self.clone();
        }
        let mut ranges = self.ranges.clone();
        ranges.rotate_left(offset % n);
        RangeScan::new(ranges)
    }
}

impl From<Vec<f64>> for RangeScan {
    fn from(ranges: Vec<f64>) -> Self {
        Self::new(ranges)
    }
}
