//! Episode/step state machine.
//!
//! ```text
//!   NewEnvironment ─► NewPose ─► UpdateLikelihood ─┐ (per step)
//!         ▲              ▲            ▲────────────┘
//!         │              │            │ step budget reached
//!         │              └──── EndOfEpisode ◄─┘
//!         │                      │ episode budget reached
//!         └──────────── EndOfEnvironment ─► Terminal
//! ```
//!
//! One map (re)generation per environment, one belief reset per episode,
//! and one sense → fuse → decide → move → transition sequence per step.
//! On the last step of an episode the decision is reported but not
//! executed. A placement failure on a generated environment requests a
//! fresh map, a bounded number of times.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::{LocalizationError, Result};
use crate::io::ReferenceTableCache;
use crate::likelihood::LikelihoodProvider;
use crate::map::{FieldSpec, MazeGenerator, OccupancyMap};
use crate::sensor::{BuildOptions, CancelToken, NoiseGenerator, ReferenceScanTable};

use super::executor::{MotionExecutor, MotionOutcome, RangeSensor};
use super::localization::{LocalizationSession, SessionConfig};
use super::placement::{PlacementConfig, place};
use super::sink::{EpisodeSummary, StepReport, StepSink};

/// Map regenerations allowed after consecutive placement failures
const MAX_REGENERATIONS: usize = 3;

/// Noise stream of the start placement
const PLACEMENT_STREAM: u64 = 1;

/// Controller state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerState {
    /// Generate or load the next map and its reference table
    NewEnvironment,
    /// Place the robot and reset the belief
    NewPose,
    /// Sense, fuse, decide and move
    UpdateLikelihood,
    /// Report the finished episode
    EndOfEpisode,
    /// Move on to the next environment
    EndOfEnvironment,
    /// All budgets exhausted
    Terminal,
}

impl ControllerState {
    /// State name for logging
    pub fn name(&self) -> &'static str {
        match self {
            ControllerState::NewEnvironment => "NewEnvironment",
            ControllerState::NewPose => "NewPose",
            ControllerState::UpdateLikelihood => "UpdateLikelihood",
            ControllerState::EndOfEpisode => "EndOfEpisode",
            ControllerState::EndOfEnvironment => "EndOfEnvironment",
            ControllerState::Terminal => "Terminal",
        }
    }

    /// Is this a terminal state?
    pub fn is_terminal(&self) -> bool {
        matches!(self, ControllerState::Terminal)
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run budgets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpisodeConfig {
    /// Maps to run
    pub environments: usize,
    /// Episodes per map
    pub episodes: usize,
    /// Steps per episode
    pub steps: usize,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            environments: 1,
            episodes: 10,
            steps: 10,
        }
    }
}

/// Controller settings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControllerConfig {
    /// Per-session settings
    pub session: SessionConfig,
    /// Map extent for generated environments
    pub field: FieldSpec,
    /// Budgets
    pub budget: EpisodeConfig,
    /// Start placement
    pub placement: PlacementConfig,
    /// Reference table build
    pub build: BuildOptions,
}

/// Where environment maps come from.
pub enum EnvironmentSource {
    /// A fresh procedural map per environment
    Generated(MazeGenerator),
    /// The same map every time
    Fixed(Arc<OccupancyMap>),
}

/// External collaborators driven by the controller.
pub struct Collaborators<'a> {
    /// Live scans
    pub sensor: &'a mut dyn RangeSensor,
    /// Action execution
    pub executor: &'a mut dyn MotionExecutor,
    /// Per-step observer
    pub sink: &'a mut dyn StepSink,
    /// Learned likelihood, when the session fuses one
    pub provider: Option<&'a dyn LikelihoodProvider>,
}

/// Totals of a finished run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Environments completed
    pub environments: usize,
    /// Episodes completed
    pub episodes: usize,
    /// Steps completed
    pub steps: usize,
    /// Refused motions
    pub collisions: usize,
}

/// Drives sessions through environments, episodes and steps.
pub struct EpisodeController {
    config: ControllerConfig,
    state: ControllerState,
    source: EnvironmentSource,
    cache: Option<ReferenceTableCache>,
    cancel: CancelToken,
    placement_noise: NoiseGenerator,

    map: Option<Arc<OccupancyMap>>,
    table: Option<Arc<ReferenceScanTable>>,
    session: Option<LocalizationSession>,

    environment: usize,
    episode: usize,
    regenerations: usize,
    last_entropy: f64,
    last_error: Option<usize>,
    totals: RunSummary,
}

impl EpisodeController {
    /// Create a controller in `NewEnvironment`.
    pub fn new(config: ControllerConfig, source: EnvironmentSource) -> Self {
        let placement_noise = NoiseGenerator::derive(config.session.seed, PLACEMENT_STREAM);
        Self {
            config,
            state: ControllerState::NewEnvironment,
            source,
            cache: None,
            cancel: CancelToken::new(),
            placement_noise,
            map: None,
            table: None,
            session: None,
            environment: 0,
            episode: 0,
            regenerations: 0,
            last_entropy: 0.0,
            last_error: None,
            totals: RunSummary::default(),
        }
    }

    /// Load and store reference tables through `cache`
    pub fn with_cache(mut self, cache: ReferenceTableCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Get configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Get current state
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Token that cancels an in-flight reference table build
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Current environment index
    pub fn environment(&self) -> usize {
        self.environment
    }

    /// Current episode index
    pub fn episode(&self) -> usize {
        self.episode
    }

    /// Active session, once the first pose is placed
    pub fn session(&self) -> Option<&LocalizationSession> {
        self.session.as_ref()
    }

    /// Current map
    pub fn map(&self) -> Option<&Arc<OccupancyMap>> {
        self.map.as_ref()
    }

    /// Totals so far
    pub fn totals(&self) -> RunSummary {
        self.totals
    }

    /// Run one state and move to the next.
    pub fn advance(&mut self, io: &mut Collaborators<'_>) -> Result<ControllerState> {
        let next = match self.state {
            ControllerState::NewEnvironment => self.new_environment()?,
            ControllerState::NewPose => self.new_pose()?,
            ControllerState::UpdateLikelihood => self.update(io)?,
            ControllerState::EndOfEpisode => self.end_of_episode(io),
            ControllerState::EndOfEnvironment => self.end_of_environment(),
            ControllerState::Terminal => ControllerState::Terminal,
        };
        if next != self.state {
            debug!("[Session] {} -> {}", self.state, next);
        }
        self.state = next;
        Ok(next)
    }

    /// Advance until `Terminal`.
    pub fn run(&mut self, io: &mut Collaborators<'_>) -> Result<RunSummary> {
        while !self.state.is_terminal() {
            self.advance(io)?;
        }
        Ok(self.totals)
    }

    fn new_environment(&mut self) -> Result<ControllerState> {
        let map = match &mut self.source {
            EnvironmentSource::Generated(generator) => {
                Arc::new(generator.environment(self.config.field)?)
            }
            EnvironmentSource::Fixed(map) => Arc::clone(map),
        };
        let scan = &self.config.session.scan;
        let table = match &self.cache {
            Some(cache) => cache.load_or_build(&map, scan, self.config.build, &self.cancel)?,
            None => ReferenceScanTable::build(&map, scan, self.config.build, &self.cancel)?,
        };

        info!(
            "[Session] environment {} ready: map {:016x}, grid {:?}",
            self.environment,
            map.id(),
            map.grid_dims()
        );
        self.map = Some(map);
        self.table = Some(Arc::new(table));
        self.session = None;
        Ok(ControllerState::NewPose)
    }

    fn new_pose(&mut self) -> Result<ControllerState> {
        let (map, table) = match (&self.map, &self.table) {
            (Some(map), Some(table)) => (Arc::clone(map), Arc::clone(table)),
            _ => return Err(LocalizationError::config("no environment loaded")),
        };
        let geometry = map.geometry(self.config.session.headings);

        let placement = match place(
            &map,
            &geometry,
            &self.config.placement,
            &mut self.placement_noise,
        ) {
            Ok(placement) => placement,
            Err(e)
                if e.is_recoverable()
                    && matches!(self.source, EnvironmentSource::Generated(_))
                    && self.regenerations < MAX_REGENERATIONS =>
            {
                self.regenerations += 1;
                warn!(
                    "[Session] {}, regenerating environment {} ({}/{})",
                    e, self.environment, self.regenerations, MAX_REGENERATIONS
                );
                return Ok(ControllerState::NewEnvironment);
            }
            Err(e) => return Err(e),
        };
        self.regenerations = 0;

        match &mut self.session {
            Some(session) => session.reset(placement.truth),
            None => {
                self.session = Some(LocalizationSession::new(
                    self.config.session.clone(),
                    map,
                    table,
                    placement.truth,
                )?)
            }
        }
        debug!(
            "[Session] env {} episode {} starts at {:?}",
            self.environment, self.episode, placement.cell
        );
        Ok(ControllerState::UpdateLikelihood)
    }

    fn update(&mut self, io: &mut Collaborators<'_>) -> Result<ControllerState> {
        let steps = self.config.budget.steps;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| LocalizationError::config("no active session"))?;
        if session.step() >= steps {
            return Ok(ControllerState::EndOfEpisode);
        }

        let truth = session.truth();
        let scan = io.sensor.sense(&truth, session.map())?;
        let fusion = session.observe(&scan, io.provider)?;
        let decision = session.decide(&scan, io.provider)?;

        // Metrics and snapshot describe the fused belief, before motion
        let belief = session.belief();
        let manhattan_error = session.manhattan_error();
        let euclidean_error = session.euclidean_error();
        let believed = session.believed();

        let last = session.step() + 1 >= steps;
        let outcome = if last {
            None
        } else {
            let outcome: MotionOutcome =
                io.executor
                    .execute_action(decision.action, &truth, session.map())?;
            session.apply_motion(decision.action, &outcome);
            Some(outcome)
        };

        let report = StepReport {
            environment: self.environment,
            episode: self.episode,
            step: session.step(),
            believed,
            map_pose: fusion.map_pose,
            truth,
            truth_grid: fusion.truth_grid,
            action: decision.action,
            scores: decision.scores,
            moved: outcome.is_some_and(|o| !o.collided),
            collided: outcome.is_some_and(|o| o.collided),
            entropy: fusion.entropy,
            likelihood: fusion.likelihood,
            ground_truth_likelihood: fusion.ground_truth_likelihood,
            belief,
            manhattan_error,
            euclidean_error,
            new_pose: fusion.new_pose,
            new_belief: fusion.new_belief,
        };
        session.complete_step();
        io.sink.on_step(&report);

        self.last_entropy = fusion.entropy;
        self.last_error = manhattan_error;
        self.totals.steps += 1;

        Ok(if last {
            ControllerState::EndOfEpisode
        } else {
            ControllerState::UpdateLikelihood
        })
    }

    fn end_of_episode(&mut self, io: &mut Collaborators<'_>) -> ControllerState {
        if let Some(session) = &self.session {
            let summary = EpisodeSummary {
                environment: self.environment,
                episode: self.episode,
                steps: session.step(),
                collisions: session.collisions(),
                final_entropy: self.last_entropy,
                final_manhattan_error: self.last_error,
                poses_explored: session.poses_explored(),
            };
            info!(
                "[Session] env {} episode {} done: {} steps, entropy {:.3}, error {:?}",
                summary.environment,
                summary.episode,
                summary.steps,
                summary.final_entropy,
                summary.final_manhattan_error
            );
            self.totals.collisions += summary.collisions;
            io.sink.on_episode_end(&summary);
        }
        self.totals.episodes += 1;
        self.episode += 1;
        self.last_error = None;

        if self.episode < self.config.budget.episodes {
            ControllerState::NewPose
        } else {
            ControllerState::EndOfEnvironment
        }
    }

    fn end_of_environment(&mut self) -> ControllerState {
        self.totals.environments += 1;
        self.environment += 1;
        self.episode = 0;
        if self.environment < self.config.budget.environments {
            ControllerState::NewEnvironment
        } else {
            ControllerState::Terminal
        }
    }
}
