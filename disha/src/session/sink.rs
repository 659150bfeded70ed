//! Per-step reporting to reward, learning and logging consumers.
//!
//! Sinks observe only; nothing they do feeds back into the engine.

use std::sync::Arc;

use log::info;

use crate::core::{Action, GridPose, Pose};
use crate::filter::BeliefSnapshot;
use crate::likelihood::LikelihoodField;

/// Everything observable about one completed step.
#[derive(Clone, Debug)]
pub struct StepReport {
    /// Environment index
    pub environment: usize,
    /// Episode index within the environment
    pub episode: usize,
    /// Step index within the episode
    pub step: usize,
    /// Believed pose (MAP cell centre) after fusion
    pub believed: Pose,
    /// MAP grid pose after fusion
    pub map_pose: GridPose,
    /// Truth pose the scan was taken from
    pub truth: Pose,
    /// Truth grid pose, `None` if the truth left the grid
    pub truth_grid: Option<GridPose>,
    /// Chosen action
    pub action: Action,
    /// Lookahead scores `(candidate, entropy drop)`
    pub scores: Vec<(Action, f64)>,
    /// Whether the action was executed (false on the final step)
    pub moved: bool,
    /// Motion refused by a collision
    pub collided: bool,
    /// Shannon entropy after fusion (nats)
    pub entropy: f64,
    /// Likelihood that was fused
    pub likelihood: Arc<LikelihoodField>,
    /// Ground-truth likelihood of the same scan
    pub ground_truth_likelihood: Arc<LikelihoodField>,
    /// Belief after fusion
    pub belief: BeliefSnapshot,
    /// Grid Manhattan error (circular heading distance)
    pub manhattan_error: Option<usize>,
    /// Euclidean position error of the believed pose (meters)
    pub euclidean_error: f64,
    /// Truth grid pose not visited before in this episode
    pub new_pose: bool,
    /// MAP cell not believed before in this episode
    pub new_belief: bool,
}

/// Aggregates of one finished episode.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeSummary {
    /// Environment index
    pub environment: usize,
    /// Episode index
    pub episode: usize,
    /// Steps taken
    pub steps: usize,
    /// Refused motions
    pub collisions: usize,
    /// Entropy at the last step (nats)
    pub final_entropy: f64,
    /// Manhattan error at the last step
    pub final_manhattan_error: Option<usize>,
    /// Distinct truth grid poses visited
    pub poses_explored: usize,
}

/// Observer of engine progress.
pub trait StepSink {
    /// Called once per step, after motion
    fn on_step(&mut self, report: &StepReport);

    /// Called when an episode ends
    fn on_episode_end(&mut self, _summary: &EpisodeSummary) {}
}

/// Sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl StepSink for NullSink {
    fn on_step(&mut self, _report: &StepReport) {}
}

/// Sink that logs one line per episode.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl StepSink for LogSink {
    fn on_step(&mut self, _report: &StepReport) {}

    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        info!(
            "[Session] env {} episode {}: {} steps, {} collisions, entropy {:.3}, error {:?}",
            summary.environment,
            summary.episode,
            summary.steps,
            summary.collisions,
            summary.final_entropy,
            summary.final_manhattan_error
        );
    }
}

/// Sink that keeps every report, for tests and offline analysis.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    /// Step reports in order
    pub steps: Vec<StepReport>,
    /// Episode summaries in order
    pub episodes: Vec<EpisodeSummary>,
}

impl StepSink for RecordingSink {
    fn on_step(&mut self, report: &StepReport) {
        self.steps.push(report.clone());
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        self.episodes.push(summary.clone());
    }
}
