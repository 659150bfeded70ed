//! Motion execution and live sensing seams.
//!
//! The engine only needs "do this action, tell me where the robot ended
//! up and whether it hit something" and "give me a scan". Simulation
//! implements both against the occupancy map; a real robot would wrap
//! its drive and lidar here.

use std::f64::consts::TAU;

use log::trace;

use crate::core::{Action, Pose};
use crate::error::Result;
use crate::map::OccupancyMap;
use crate::sensor::{NoiseGenerator, RangeScan, ScanOptions, cast_scan};

/// Result of one executed action.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionOutcome {
    /// Truth pose after the action (unchanged on collision)
    pub truth: Pose,
    /// The motion was refused because the goal collides
    pub collided: bool,
}

/// Executes actions on the (real or simulated) robot.
pub trait MotionExecutor {
    /// Execute `action` starting from `truth`.
    fn execute_action(
        &mut self,
        action: Action,
        truth: &Pose,
        map: &OccupancyMap,
    ) -> Result<MotionOutcome>;
}

/// Produces live range scans.
pub trait RangeSensor {
    /// Scan taken at `truth`
    fn sense(&mut self, truth: &Pose, map: &OccupancyMap) -> Result<RangeScan>;
}

/// Teleport motion parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TeleportConfig {
    /// Distance of one forward step (meters)
    pub forward_step_m: f64,
    /// Heading bins per turn
    pub rotation_step: usize,
    /// Number of heading bins
    pub headings: usize,
    /// Position noise σ (meters)
    pub noise_xy: f64,
    /// Heading noise σ (radians)
    pub noise_theta: f64,
    /// Robot radius for the goal check (meters)
    pub collision_radius: f64,
}

impl Default for TeleportConfig {
    fn default() -> Self {
        Self {
            forward_step_m: 0.5,
            rotation_step: 1,
            headings: 4,
            noise_xy: 0.0,
            noise_theta: 0.0,
            collision_radius: 0.25,
        }
    }
}

/// Simulated executor that jumps the truth pose to the noisy goal.
#[derive(Clone, Debug)]
pub struct TeleportExecutor {
    config: TeleportConfig,
    noise: NoiseGenerator,
}

impl TeleportExecutor {
    /// Create an executor
    pub fn new(config: TeleportConfig, seed: u64) -> Self {
        Self {
            config,
            noise: NoiseGenerator::new(seed),
        }
    }

    /// Executor parameters
    pub fn config(&self) -> &TeleportConfig {
        &self.config
    }

    /// Noise-free goal of `action` from `from`
    pub fn goal(&self, from: &Pose, action: Action) -> Pose {
        let turn = self.config.rotation_step as f64 * TAU / self.config.headings as f64;
        match action {
            Action::TurnLeft => Pose::new(from.theta + turn, from.x, from.y),
            Action::TurnRight => Pose::new(from.theta - turn, from.x, from.y),
            Action::GoForward => Pose::new(
                from.theta,
                from.x + from.theta.cos() * self.config.forward_step_m,
                from.y + from.theta.sin() * self.config.forward_step_m,
            ),
            Action::Hold => *from,
        }
    }
}

impl MotionExecutor for TeleportExecutor {
    fn execute_action(
        &mut self,
        action: Action,
        truth: &Pose,
        map: &OccupancyMap,
    ) -> Result<MotionOutcome> {
        if action == Action::Hold {
            return Ok(MotionOutcome {
                truth: *truth,
                collided: false,
            });
        }
        let goal = self.goal(truth, action);
        let goal = Pose::new(
            goal.theta + self.noise.gaussian(self.config.noise_theta),
            goal.x + self.noise.gaussian(self.config.noise_xy),
            goal.y + self.noise.gaussian(self.config.noise_xy),
        );
        if map.collides(goal.x, goal.y, self.config.collision_radius) {
            trace!("[Teleport] {} blocked at ({:.2}, {:.2})", action, goal.x, goal.y);
            return Ok(MotionOutcome {
                truth: *truth,
                collided: true,
            });
        }
        Ok(MotionOutcome {
            truth: goal,
            collided: false,
        })
    }
}

/// Ray-cast sensor over the map with the configured degradations.
#[derive(Clone, Debug)]
pub struct SimulatedRangeSensor {
    options: ScanOptions,
    noise: NoiseGenerator,
}

impl SimulatedRangeSensor {
    /// Create a sensor
    pub fn new(options: ScanOptions, seed: u64) -> Self {
        Self {
            options,
            noise: NoiseGenerator::new(seed),
        }
    }

    /// Scan options
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }
}

impl RangeSensor for SimulatedRangeSensor {
    fn sense(&mut self, truth: &Pose, map: &OccupancyMap) -> Result<RangeScan> {
        Ok(cast_scan(truth, map, &self.options, &mut self.noise))
    }
}
