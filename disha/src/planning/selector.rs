//! One-step entropy lookahead action selection.
//!
//! For each candidate action a copy of the belief is pushed through the
//! transition model, a noiseless scan is simulated at the pose the action
//! would reach from the believed pose, and the resulting likelihood is
//! fused into the copy:
//!
//! ```text
//!   belief ──clone──► transition(a) ──► fuse(L(scan(target(a)))) ──► Σp·ln p
//! ```
//!
//! `score(a) = Σp·ln p (after) − Σp·ln p (now)`, i.e. the entropy drop.
//! The largest score wins; scores within `tolerance` of the best keep the
//! earlier action in `turn_left, turn_right, go_forward` order.
//!
//! The live belief is never touched.

use log::debug;

use crate::core::{Action, Pose};
use crate::error::Result;
use crate::filter::{Belief, TransitionModel};
use crate::likelihood::{LikelihoodBuilder, Observation};
use crate::sensor::{NoiseGenerator, ScanOptions, cast_scan};

/// Selector parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectorConfig {
    /// Distance of one forward step (meters)
    pub forward_step_m: f64,
    /// Heading bins per turn
    pub rotation_step: usize,
    /// Scores closer than this to the best count as ties
    pub tolerance: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            forward_step_m: 0.5,
            rotation_step: 1,
            tolerance: 1e-9,
        }
    }
}

/// Chosen action with every candidate's score, in evaluation order.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionDecision {
    /// Selected action
    pub action: Action,
    /// `(candidate, score)` pairs
    pub scores: Vec<(Action, f64)>,
}

impl ActionDecision {
    /// Score of `action`, if it was a candidate
    pub fn score_of(&self, action: Action) -> Option<f64> {
        self.scores
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, s)| *s)
    }
}

/// Greedy entropy-reduction selector.
#[derive(Clone, Debug)]
pub struct ActionSelector {
    config: SelectorConfig,
    transition: TransitionModel,
    builder: LikelihoodBuilder,
    scan_options: ScanOptions,
    noise: NoiseGenerator,
}

impl ActionSelector {
    /// Create a selector. Simulated scans use `scan_options` without noise;
    /// `noise` only drives the ray step jitter.
    pub fn new(
        config: SelectorConfig,
        transition: TransitionModel,
        builder: LikelihoodBuilder,
        scan_options: &ScanOptions,
        noise: NoiseGenerator,
    ) -> Self {
        Self {
            config,
            transition,
            builder,
            scan_options: scan_options.noiseless(),
            noise,
        }
    }

    /// Selector parameters
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Candidate actions in priority order.
    pub fn candidates(forward_blocked: bool) -> Vec<Action> {
        Action::PRIORITY
            .iter()
            .copied()
            .filter(|a| !(forward_blocked && *a == Action::GoForward))
            .collect()
    }

    /// Pose reached by `action` from `from`, with `headings` heading bins.
    pub fn target_pose(&self, from: &Pose, action: Action, headings: usize) -> Pose {
        let turn = self.config.rotation_step as f64 * std::f64::consts::TAU / headings as f64;
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

    /// Entropy drop expected from `action`.
    pub fn score(
        &mut self,
        observation: &Observation<'_>,
        belief: &Belief,
        believed: &Pose,
        action: Action,
    ) -> Result<f64> {
        let mut projected = belief.clone();
        self.transition.apply(&mut projected, action);

        let target = self.target_pose(believed, action, belief.shape().headings);
        let scan = cast_scan(&target, observation.map, &self.scan_options, &mut self.noise);
        let likelihood = observation.likelihood(&self.builder, &scan)?;
        projected.fuse(&likelihood)?;

        Ok(projected.negentropy() - belief.negentropy())
    }

    /// Pick the action with the largest entropy drop.
    ///
    /// `go_forward` is not evaluated when `forward_blocked` is set.
    pub fn select(
        &mut self,
        observation: &Observation<'_>,
        belief: &Belief,
        believed: &Pose,
        forward_blocked: bool,
    ) -> Result<ActionDecision> {
        let mut scores = Vec::with_capacity(Action::PRIORITY.len());
        let mut best: Option<(Action, f64)> = None;

        for action in Self::candidates(forward_blocked) {
            let score = self.score(observation, belief, believed, action)?;
            debug!("[Selector] {} score {:.6}", action, score);
            scores.push((action, score));
            match best {
                Some((_, s)) if score <= s + self.config.tolerance => {}
                _ => best = Some((action, score)),
            }
        }

        // Candidates always contain both turns
        let action = best.map(|(a, _)| a).unwrap_or(Action::TurnLeft);
        debug!(
            "[Selector] chose {} (forward blocked: {})",
            action, forward_blocked
        );
        Ok(ActionDecision { action, scores })
    }
}
