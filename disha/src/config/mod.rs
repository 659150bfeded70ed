//! Unified configuration loading for Disha.
//!
//! Loads all configuration from a single YAML file with sensible defaults.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use disha::config::DishaConfig;
//!
//! // Load from default path (configs/config.yaml)
//! let config = DishaConfig::load_default()?;
//!
//! // Convert to runtime configs
//! let controller = config.to_controller_config();
//! let mut executor = config.teleport_executor();
//! let mut sensor = config.range_sensor();
//! ```
//!
//! ## Configuration Sections
//!
//! | Section | Description |
//! |---------|-------------|
//! | [`GridSection`] | Headings, belief grid, map extent and resolution |
//! | [`SensorSection`] | Simulated lidar geometry and degradations |
//! | [`LikelihoodSection`] | Source, similarity, normalization |
//! | [`MotionSection`] | Transition model, process noise, robot radius |
//! | [`EpisodeSection`] | Budgets, start placement, seed |
//! | [`MazeSection`] | Procedural map generator |
//! | [`ParallelSection`] | Reference table worker pool |
//! | [`PersistenceSection`] | Reference table cache |
//!
//! ## Example YAML
//!
//! ```yaml
//! grid:
//!   headings: 4
//!   rows: 11
//!   cols: 11
//!   x_limits: [-3.0, 3.0]
//!
//! likelihood:
//!   source: ground_truth      # ground_truth | provider | uniform
//!   similarity: cosine        # cosine | correlation_clip | correlation_rescale
//!   normalization: softmax    # softmax | softermax | linear
//!   temperature: 1.0
//!
//! motion:
//!   model: stochastic_shift   # roll | shift | stochastic_shift
//!   sigma_xy: 0.5
//! ```

mod defaults;
mod disha;
mod episode;
mod error;
mod grid;
mod likelihood;
mod maze;
mod motion;
mod parallel;
mod persistence;
mod sensor;

// Re-export main types
pub use disha::DishaConfig;
pub use error::ConfigLoadError;

// Re-export section types
pub use episode::EpisodeSection;
pub use grid::GridSection;
pub use likelihood::{LikelihoodSection, NormalizationKind};
pub use maze::MazeSection;
pub use motion::MotionSection;
pub use parallel::ParallelSection;
pub use persistence::PersistenceSection;
pub use sensor::SensorSection;
