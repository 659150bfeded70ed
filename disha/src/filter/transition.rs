//! Motion model applied to the whole belief after an action.
//!
//! | Action | Effect |
//! |--------|--------|
//! | TurnLeft | roll heading axis by `+rotation_step` |
//! | TurnRight | roll heading axis by `−rotation_step` |
//! | GoForward | per heading, shift the slice by `round(forward_step · (cos θ, sin θ))` |
//! | Hold | nothing |
//!
//! `Shift` keeps mass that would leave the grid on the boundary row/column
//! and fills exposed cells with the slice minimum before the shift.
//! `Roll` wraps spatially. `StochasticShift` follows the shift with a
//! Gaussian blur per slice and a leak into neighbouring headings.
//!
//! Every variant leaves the belief normalized.

use serde::{Deserialize, Serialize};

use crate::core::{Action, GridShape, TWO_PI};

use super::belief::Belief;

/// Gaussian kernel truncation in sigmas
const KERNEL_TRUNCATE: f64 = 4.0;

/// Motion model variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionModelKind {
    /// Cyclic spatial roll
    Roll,
    /// No-flux shift with minimum fill
    Shift,
    /// Shift, Gaussian diffusion and heading leak
    #[default]
    StochasticShift,
}

/// Transition parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionConfig {
    /// Model variant
    pub model: MotionModelKind,
    /// Heading bins per turn
    pub rotation_step: usize,
    /// Grid cells per forward step
    pub forward_step: usize,
    /// Spatial diffusion sigma in cells (0 disables)
    pub sigma_xy: f64,
    /// Fraction leaked per heading ring
    pub heading_leak: f64,
    /// Number of heading rings receiving leak
    pub leak_rings: usize,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            model: MotionModelKind::StochasticShift,
            rotation_step: 1,
            forward_step: 1,
            sigma_xy: 0.5,
            heading_leak: 0.2,
            leak_rings: 1,
        }
    }
}

/// Belief transition model.
#[derive(Clone, Debug)]
pub struct TransitionModel {
    config: TransitionConfig,
    kernel: Vec<f64>,
}

impl TransitionModel {
    /// Create a model, precomputing the diffusion kernel.
    pub fn new(config: TransitionConfig) -> Self {
        let kernel = gaussian_kernel(config.sigma_xy);
        Self { config, kernel }
    }

    /// Model parameters
    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    /// Grid delta `(d_row, d_col)` of one forward step at heading `head`.
    pub fn forward_delta(&self, head: usize, headings: usize) -> (i64, i64) {
        let theta = head as f64 * TWO_PI / headings as f64;
        let step = self.config.forward_step as f64;
        // Round before casting; cos(π/2) is ~6e-17, not 0
        (
            (step * theta.cos()).round() as i64,
            (step * theta.sin()).round() as i64,
        )
    }

    /// Apply `action` to `belief` in place.
    pub fn apply(&self, belief: &mut Belief, action: Action) {
        if action == Action::Hold {
            return;
        }
        let shape = belief.shape();
        if shape.is_empty() {
            return;
        }
        let data = belief.data_mut();
        let rot = self.config.rotation_step as i64;

        match action {
            Action::TurnLeft => roll_headings(data, shape, rot),
            Action::TurnRight => roll_headings(data, shape, -rot),
            Action::GoForward => {
                let slice_len = shape.slice_len();
                for (head, slice) in data.chunks_mut(slice_len).enumerate() {
                    let (dr, dc) = self.forward_delta(head, shape.headings);
                    match self.config.model {
                        MotionModelKind::Roll => roll_slice(slice, shape, dr, dc),
                        _ => shift_slice(slice, shape, dr, dc),
                    }
                }
            }
            Action::Hold => {}
        }

        if self.config.model == MotionModelKind::StochasticShift {
            if self.kernel.len() > 1 {
                for slice in data.chunks_mut(shape.slice_len()) {
                    blur_slice(slice, shape, &self.kernel);
                }
            }
            leak_headings(
                data,
                shape,
                self.config.heading_leak,
                self.config.leak_rings,
            );
        }
        rescale(data);
    }
}

/// Divide by total mass when it is positive and finite.
fn rescale(data: &mut [f64]) {
    let total: f64 = data.iter().sum();
    if total > 0.0 && total.is_finite() {
        data.iter_mut().for_each(|v| *v /= total);
    }
}

/// Cyclic roll along the heading axis: mass at `h` moves to `h + k`.
fn roll_headings(data: &mut [f64], shape: GridShape, k: i64) {
    let d = shape.headings as i64;
    let k = k.rem_euclid(d) as usize;
    if k == 0 {
        return;
    }
    data.rotate_right(k * shape.slice_len());
}

/// Cyclic spatial roll of one heading slice.
fn roll_slice(slice: &mut [f64], shape: GridShape, dr: i64, dc: i64) {
    let (rows, cols) = (shape.rows as i64, shape.cols as i64);
    let src = slice.to_vec();
    for r in 0..rows {
        for c in 0..cols {
            let nr = (r + dr).rem_euclid(rows);
            let nc = (c + dc).rem_euclid(cols);
            slice[(nr * cols + nc) as usize] = src[(r * cols + c) as usize];
        }
    }
}

/// No-flux shift of one heading slice.
fn shift_slice(slice: &mut [f64], shape: GridShape, dr: i64, dc: i64) {
    if dr == 0 && dc == 0 {
        return;
    }
    let fill = slice.iter().cloned().fold(f64::INFINITY, f64::min);
    let (rows, cols) = (shape.rows, shape.cols);
    let mut line = Vec::with_capacity(rows.max(cols));

    if dr != 0 {
        for c in 0..cols {
            line.clear();
            line.extend((0..rows).map(|r| slice[r * cols + c]));
            shift_line(&mut line, dr, fill);
            for (r, v) in line.iter().enumerate() {
                slice[r * cols + c] = *v;
            }
        }
    }
    if dc != 0 {
        for row in slice.chunks_mut(cols) {
            line.clear();
            line.extend_from_slice(row);
            shift_line(&mut line, dc, fill);
            row.copy_from_slice(&line);
        }
    }
}

/// Shift a line by `d`; overflow piles on the far end, exposed cells get `fill`.
fn shift_line(line: &mut [f64], d: i64, fill: f64) {
    let n = line.len();
    if n == 0 || d == 0 {
        return;
    }
    let src = line.to_vec();
    let mut reached = vec![false; n];
    line.fill(0.0);
    for (i, &v) in src.iter().enumerate() {
        let j = (i as i64 + d).clamp(0, n as i64 - 1) as usize;
        line[j] += v;
        reached[j] = true;
    }
    for (v, _) in line.iter_mut().zip(&reached).filter(|(_, r)| !**r) {
        *v = fill;
    }
}

/// Sampled Gaussian, truncated at 4 sigma, normalized to 1.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    if !(sigma > 0.0) {
        return vec![1.0];
    }
    let radius = (KERNEL_TRUNCATE * sigma + 0.5) as i64;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
        .collect();
    let total: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= total);
    kernel
}

/// Half-sample symmetric index (`d c b a | a b c d | d c b a`).
fn reflect(i: i64, n: i64) -> usize {
    let period = 2 * n;
    let m = i.rem_euclid(period);
    (if m < n { m } else { period - m - 1 }) as usize
}

/// Separable Gaussian blur of one slice with reflected borders.
fn blur_slice(slice: &mut [f64], shape: GridShape, kernel: &[f64]) {
    let (rows, cols) = (shape.rows, shape.cols);
    let radius = (kernel.len() / 2) as i64;
    let src = slice.to_vec();
    let mut tmp = vec![0.0; slice.len()];

    for r in 0..rows {
        for c in 0..cols {
            tmp[r * cols + c] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * src[reflect(r as i64 + k as i64 - radius, rows as i64) * cols + c])
                .sum();
        }
    }
    for r in 0..rows {
        for c in 0..cols {
            slice[r * cols + c] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * tmp[r * cols + reflect(c as i64 + k as i64 - radius, cols as i64)])
                .sum();
        }
    }
}

/// Mix each heading with its neighbours: ring `r` contributes `leak^r`.
fn leak_headings(data: &mut [f64], shape: GridShape, leak: f64, rings: usize) {
    let d = shape.headings;
    if d < 2 || rings == 0 || !(leak > 0.0) {
        return;
    }
    let n = shape.slice_len();
    let src = data.to_vec();
    for h in 0..d {
        for ring in 1..=rings {
            let w = leak.powi(ring as i32);
            let left = (h + ring) % d;
            let right = (h + d - ring % d) % d;
            for i in 0..n {
                data[h * n + i] += w * (src[left * n + i] + src[right * n + i]);
            }
        }
    }
}
