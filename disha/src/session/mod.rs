//! Localization sessions and the episode controller.
//!
//! - [`LocalizationSession`]: per-run belief, poses and bookkeeping
//! - [`EpisodeController`]: environment / episode / step state machine
//! - [`MotionExecutor`], [`RangeSensor`], [`StepSink`]: seams to the robot
//!   (or simulation) and to reward, learning and logging consumers

mod controller;
mod executor;
mod localization;
mod placement;
mod sink;

pub use controller::{
    Collaborators, ControllerConfig, ControllerState, EnvironmentSource, EpisodeConfig,
    EpisodeController, RunSummary,
};
pub use executor::{
    MotionExecutor, MotionOutcome, RangeSensor, SimulatedRangeSensor, TeleportConfig,
    TeleportExecutor,
};
pub use localization::{Fusion, LocalizationSession, SessionConfig};
pub use placement::{InitError, Placement, PlacementConfig, place};
pub use sink::{EpisodeSummary, LogSink, NullSink, RecordingSink, StepReport, StepSink};
