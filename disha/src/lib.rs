//! # Disha
//!
//! Active Markov localization on a discrete pose grid.
//!
//! ## Overview
//!
//! The robot's pose is a probability distribution over `D × R × C` grid
//! poses (heading, row, column). Each step:
//!
//! 1. a range scan is compared against precomputed reference scans to get
//!    a likelihood per pose
//! 2. the likelihood is fused into the belief (Bayes update)
//! 3. every candidate action is simulated on a copy of the belief and the
//!    one with the largest expected entropy drop is chosen
//! 4. the action is executed and the belief is pushed through the
//!    transition model
//!
//! ## Features
//!
//! - **Synthetic lidar**: ray marching over a high-res occupancy map with
//!   jitter, FOV masking, missing rays and range noise
//! - **Reference tables**: one scan per grid cell, built in parallel on
//!   rayon, cancellable, cached on disk by map identity
//! - **Belief filter**: fuse, normalize, MAP estimate, entropy, immutable
//!   `Arc` snapshots
//! - **Motion models**: heading roll, no-flux shift, Gaussian diffusion with
//!   heading leak
//! - **Entropy lookahead**: collision-aware greedy action selection
//! - **Episode controller**: environment / episode / step state machine
//!   with pluggable sensor, executor, likelihood provider and sinks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use disha::config::DishaConfig;
//! use disha::session::{Collaborators, EnvironmentSource, EpisodeController, LogSink};
//!
//! let config = DishaConfig::load_default()?;
//! let mut controller = EpisodeController::new(
//!     config.to_controller_config(),
//!     EnvironmentSource::Generated(config.maze_generator()),
//! );
//!
//! let mut sensor = config.range_sensor();
//! let mut executor = config.teleport_executor();
//! let mut sink = LogSink;
//! let totals = controller.run(&mut Collaborators {
//!     sensor: &mut sensor,
//!     executor: &mut executor,
//!     sink: &mut sink,
//!     provider: None,
//! })?;
//! ```
//!
//! ## Coordinate System
//!
//! - Grid rows follow X, columns follow Y
//! - Theta: radians, CCW positive from +X, wrapped to `(-π, π]`
//! - Heading bin `h` is centred on `h · 2π / D`

#![warn(missing_docs)]

// Geometry, poses and actions
pub mod core;

// Error taxonomy
pub mod error;

// YAML configuration
pub mod config;

// Occupancy maps and procedural environments
pub mod map;

// Synthetic range sensor and reference tables
pub mod sensor;

// Observation likelihood
pub mod likelihood;

// Belief and transition model
pub mod filter;

// Action selection
pub mod planning;

// Sessions, controller and external seams
pub mod session;

// Persistence (maps, reference tables)
pub mod io;

// Re-export commonly used types
pub use core::{Action, GridLimits, GridPose, GridShape, Pose};

pub use error::{LocalizationError, Result};

pub use config::{ConfigLoadError, DishaConfig};

pub use map::{MazeGenerator, OccupancyMap};

pub use sensor::{CancelToken, RangeScan, ReferenceScanTable, ScanOptions, cast_scan};

pub use likelihood::{LikelihoodBuilder, LikelihoodField, LikelihoodProvider};

pub use filter::{Belief, BeliefSnapshot, TransitionModel};

pub use planning::{ActionDecision, ActionSelector};

pub use session::{
    EpisodeController, LocalizationSession, MotionExecutor, RangeSensor, StepReport, StepSink,
};

pub use io::{IoError, ReferenceTableCache};
