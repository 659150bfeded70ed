//! Collision-free start poses.
//!
//! A start cell and heading are sampled until the cell-centre pose is free
//! at `collision_radius`. The truth pose may then be perturbed inside its
//! cell and heading bin; a perturbation that collides is retried and, if
//! every retry collides, the cell centre is kept.

use std::f64::consts::PI;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::core::{GridGeometry, GridPose, Pose};
use crate::error::{LocalizationError, Result};
use crate::map::OccupancyMap;
use crate::sensor::NoiseGenerator;

/// Retries for the in-cell perturbation
const PERTURB_ATTEMPTS: usize = 100;

/// Offset of the truth pose from the start cell centre.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitError {
    /// Exactly the cell centre and bin heading
    #[default]
    None,
    /// Uniform position inside the cell
    Xy,
    /// Uniform heading inside the bin
    Theta,
    /// Both
    Both,
}

impl InitError {
    fn perturbs_xy(self) -> bool {
        matches!(self, InitError::Xy | InitError::Both)
    }

    fn perturbs_theta(self) -> bool {
        matches!(self, InitError::Theta | InitError::Both)
    }
}

/// Placement parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementConfig {
    /// Robot radius for the free-space check (meters)
    pub collision_radius: f64,
    /// Cell samples before giving up
    pub attempts: usize,
    /// Truth perturbation
    pub init_error: InitError,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            collision_radius: 0.25,
            attempts: 100,
            init_error: InitError::None,
        }
    }
}

/// Sampled start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Start cell
    pub cell: GridPose,
    /// Continuous truth pose inside `cell`
    pub truth: Pose,
}

/// Sample a collision-free start pose.
pub fn place(
    map: &OccupancyMap,
    geometry: &GridGeometry,
    config: &PlacementConfig,
    noise: &mut NoiseGenerator,
) -> Result<Placement> {
    let shape = geometry.shape;
    for attempt in 1..=config.attempts {
        let cell = GridPose::new(
            noise.index(shape.headings),
            noise.index(shape.rows),
            noise.index(shape.cols),
        );
        let centre = geometry.cell_pose(cell);
        if map.collides(centre.x, centre.y, config.collision_radius) {
            continue;
        }
        debug!("[Placement] {:?} free after {} attempts", cell, attempt);
        let truth = perturb(map, geometry, cell, centre, config, noise);
        return Ok(Placement { cell, truth });
    }
    warn!(
        "[Placement] no free cell in {} attempts",
        config.attempts
    );
    Err(LocalizationError::PlacementFailure {
        attempts: config.attempts,
    })
}

fn perturb(
    map: &OccupancyMap,
    geometry: &GridGeometry,
    cell: GridPose,
    centre: Pose,
    config: &PlacementConfig,
    noise: &mut NoiseGenerator,
) -> Pose {
    if config.init_error == InitError::None {
        return centre;
    }
    let (cell_x, cell_y) = geometry.cell_size();
    let half_bin = PI / geometry.shape.headings as f64;

    for _ in 0..PERTURB_ATTEMPTS {
        let mut pose = centre;
        if config.init_error.perturbs_xy() {
            pose.x += noise.uniform_range(-0.5 * cell_x, 0.5 * cell_x);
            pose.y += noise.uniform_range(-0.5 * cell_y, 0.5 * cell_y);
        }
        if config.init_error.perturbs_theta() {
            pose = Pose::new(
                centre.theta + noise.uniform_range(-half_bin, half_bin),
                pose.x,
                pose.y,
            );
        }
        if geometry.grid_pose(&pose) == Some(cell)
            && !map.collides(pose.x, pose.y, config.collision_radius)
        {
            return pose;
        }
    }
    warn!("[Placement] perturbation kept colliding, using cell centre");
    centre
}
