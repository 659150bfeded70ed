//! Default value functions for serde deserialization.

// Grid

pub fn headings() -> usize {
    4
}

pub fn grid_cells() -> usize {
    11
}

pub fn limits() -> [f64; 2] {
    [-3.0, 3.0]
}

pub fn map_pixels() -> usize {
    224
}

// Sensor

pub fn min_range() -> f64 {
    0.10
}

pub fn max_range() -> f64 {
    3.5
}

pub fn rays() -> usize {
    360
}

pub fn march_step() -> f64 {
    0.01
}

pub fn step_jitter() -> f64 {
    0.01
}

pub fn fov() -> [f64; 2] {
    [0.0, 0.0]
}

pub fn one() -> usize {
    1
}

// Likelihood

pub fn temperature() -> f64 {
    1.0
}

pub fn occupied_radius() -> f64 {
    0.05
}

// Motion

pub fn sigma_xy() -> f64 {
    0.5
}

pub fn heading_leak() -> f64 {
    0.2
}

pub fn collision_radius() -> f64 {
    0.25
}

// Episode

pub fn episodes() -> usize {
    10
}

pub fn steps() -> usize {
    10
}

pub fn placement_attempts() -> usize {
    100
}

// Maze

pub fn obstacle_ratio() -> f64 {
    0.25
}

pub fn enabled() -> bool {
    true
}

pub fn boxes() -> usize {
    6
}

pub fn box_sides() -> [f64; 2] {
    [0.3, 0.8]
}

// Persistence

pub fn cache_dir() -> String {
    "./cache".to_string()
}
