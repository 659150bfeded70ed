//! Per-run localization state.
//!
//! `LocalizationSession` owns everything one run mutates: the belief, the
//! truth and believed poses, step counters and exploration bookkeeping.
//! Several sessions can coexist; nothing is global.
//!
//! One step, driven by [`EpisodeController`](super::EpisodeController):
//!
//! ```text
//!   observe(scan) ─► decide(scan) ─► executor ─► apply_motion ─► complete_step
//!   fuse + MAP       lookahead                   transition
//! ```
//!
//! The belief is held as an `Arc` snapshot. Mutation goes through
//! `Arc::make_mut`, so a reader holding an earlier snapshot keeps an
//! unchanged copy.

use std::sync::Arc;

use log::debug;

use crate::core::{Action, GridGeometry, GridPose, Pose};
use crate::error::{LocalizationError, Result};
use crate::filter::{Belief, BeliefSnapshot, TransitionConfig, TransitionModel};
use crate::likelihood::{
    LikelihoodBuilder, LikelihoodConfig, LikelihoodField, LikelihoodProvider, LikelihoodSource,
    Observation,
};
use crate::map::OccupancyMap;
use crate::planning::{ActionDecision, ActionSelector, SelectorConfig};
use crate::sensor::{
    NoiseGenerator, RangeScan, ReferenceScanTable, ScanImageStack, ScanOptions, SlideMap,
};

use super::executor::MotionOutcome;

/// Noise stream of the lookahead scans
const SELECTOR_STREAM: u64 = 3;

/// Runtime settings of a session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// Discrete headings (D)
    pub headings: usize,
    /// Sensor geometry (shared by live and reference scans)
    pub scan: ScanOptions,
    /// Ground-truth likelihood settings; `headings` is overridden
    pub likelihood: LikelihoodConfig,
    /// Likelihood fused each step
    pub source: LikelihoodSource,
    /// Motion model
    pub transition: TransitionConfig,
    /// Robot radius (meters)
    pub collision_radius: f64,
    /// Base seed (0 = entropy)
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headings: 4,
            scan: ScanOptions::default(),
            likelihood: LikelihoodConfig::default(),
            source: LikelihoodSource::GroundTruth,
            transition: TransitionConfig::default(),
            collision_radius: 0.25,
            seed: 0,
        }
    }
}

/// Outcome of fusing one scan.
#[derive(Clone, Debug)]
pub struct Fusion {
    /// Likelihood that was fused
    pub likelihood: Arc<LikelihoodField>,
    /// Ground-truth likelihood of the scan
    pub ground_truth_likelihood: Arc<LikelihoodField>,
    /// Shannon entropy before fusion
    pub entropy_before: f64,
    /// Shannon entropy after fusion
    pub entropy: f64,
    /// MAP grid pose after fusion
    pub map_pose: GridPose,
    /// Truth grid pose at the scan
    pub truth_grid: Option<GridPose>,
    /// Truth grid pose first seen this episode
    pub new_pose: bool,
    /// MAP cell first believed this episode
    pub new_belief: bool,
}

/// Localization state of one environment.
pub struct LocalizationSession {
    config: SessionConfig,
    geometry: GridGeometry,
    map: Arc<OccupancyMap>,
    table: Arc<ReferenceScanTable>,
    builder: LikelihoodBuilder,
    transition: TransitionModel,
    selector: ActionSelector,
    forward_step_m: f64,

    belief: BeliefSnapshot,
    truth: Pose,
    map_pose: GridPose,
    believed: Pose,

    step: usize,
    collisions: usize,
    explored: Vec<bool>,
    visited: Vec<GridPose>,
}

impl LocalizationSession {
    /// Create a session on `map` with its reference `table`, starting at
    /// `truth` with a uniform belief.
    pub fn new(
        config: SessionConfig,
        map: Arc<OccupancyMap>,
        table: Arc<ReferenceScanTable>,
        truth: Pose,
    ) -> Result<Self> {
        if config.headings == 0 {
            return Err(LocalizationError::config("zero headings"));
        }
        if table.map_id() != map.id() {
            return Err(LocalizationError::config(format!(
                "reference table belongs to map {:016x}, not {:016x}",
                table.map_id(),
                map.id()
            )));
        }
        if (table.rows(), table.cols()) != map.grid_dims() || table.rays() != config.scan.rays {
            return Err(LocalizationError::config(
                "reference table does not match grid or sensor",
            ));
        }

        let geometry = map.geometry(config.headings);
        let builder = LikelihoodBuilder::new(LikelihoodConfig {
            headings: config.headings,
            ..config.likelihood
        });
        let transition = TransitionModel::new(config.transition);
        let forward_step_m = config.transition.forward_step as f64 * geometry.cell_size().0;
        let selector = ActionSelector::new(
            SelectorConfig {
                forward_step_m,
                rotation_step: config.transition.rotation_step,
                ..SelectorConfig::default()
            },
            transition.clone(),
            builder.clone(),
            &config.scan,
            NoiseGenerator::derive(config.seed, SELECTOR_STREAM),
        );

        let belief = Belief::uniform(geometry.shape);
        let map_pose = belief.map_estimate();
        let mut session = Self {
            explored: vec![false; geometry.shape.len()],
            believed: geometry.cell_pose(map_pose),
            belief: Arc::new(belief),
            config,
            geometry,
            map,
            table,
            builder,
            transition,
            selector,
            forward_step_m,
            truth,
            map_pose,
            step: 0,
            collisions: 0,
            visited: Vec::new(),
        };
        session.reset(truth);
        Ok(session)
    }

    /// Start a new episode at `truth`: uniform belief, cleared counters.
    pub fn reset(&mut self, truth: Pose) {
        Arc::make_mut(&mut self.belief).reset();
        self.truth = truth;
        self.map_pose = self.belief.map_estimate();
        self.believed = self.geometry.cell_pose(self.map_pose);
        self.step = 0;
        self.collisions = 0;
        self.explored.iter_mut().for_each(|e| *e = false);
        self.visited.clear();
    }

    /// Session settings
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Grid geometry
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Current map
    pub fn map(&self) -> &Arc<OccupancyMap> {
        &self.map
    }

    /// Reference table of the current map
    pub fn table(&self) -> &Arc<ReferenceScanTable> {
        &self.table
    }

    /// Immutable snapshot of the belief
    pub fn belief(&self) -> BeliefSnapshot {
        Arc::clone(&self.belief)
    }

    /// Ground-truth pose
    pub fn truth(&self) -> Pose {
        self.truth
    }

    /// Truth grid pose, `None` outside the grid
    pub fn truth_grid(&self) -> Option<GridPose> {
        self.geometry.grid_pose(&self.truth)
    }

    /// Centre pose of the MAP cell
    pub fn believed(&self) -> Pose {
        self.believed
    }

    /// MAP grid pose
    pub fn map_pose(&self) -> GridPose {
        self.map_pose
    }

    /// Steps completed this episode
    pub fn step(&self) -> usize {
        self.step
    }

    /// Refused motions this episode
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Distance of one forward step (meters)
    pub fn forward_step_m(&self) -> f64 {
        self.forward_step_m
    }

    /// Distinct truth grid poses visited this episode
    pub fn poses_explored(&self) -> usize {
        self.explored.iter().filter(|&&e| e).count()
    }

    /// Manhattan grid error of the MAP pose, `None` if the truth is off-grid
    pub fn manhattan_error(&self) -> Option<usize> {
        self.truth_grid()
            .map(|t| self.map_pose.manhattan(&t, self.geometry.shape.headings, false))
    }

    /// Euclidean distance between believed and truth positions
    pub fn euclidean_error(&self) -> f64 {
        self.believed.distance(&self.truth)
    }

    /// Fuse the likelihood of `scan` into the belief and update the MAP
    /// estimate and bookkeeping.
    pub fn observe(
        &mut self,
        scan: &RangeScan,
        provider: Option<&dyn LikelihoodProvider>,
    ) -> Result<Fusion> {
        let ground_truth = Arc::new(self.builder.compute(
            Some(self.map.as_ref()),
            Some(self.table.as_ref()),
            Some(scan),
        )?);
        let likelihood = match self.config.source {
            LikelihoodSource::GroundTruth => Arc::clone(&ground_truth),
            _ => {
                let observation = Observation {
                    map: &self.map,
                    table: &self.table,
                    source: self.config.source,
                    provider,
                };
                Arc::new(observation.likelihood(&self.builder, scan)?)
            }
        };

        let entropy_before = self.belief.entropy();
        let belief = Arc::make_mut(&mut self.belief);
        belief.fuse(&likelihood)?;
        let entropy = belief.entropy();
        self.map_pose = belief.map_estimate();
        self.believed = self.geometry.cell_pose(self.map_pose);

        let truth_grid = self.truth_grid();
        let new_pose = match truth_grid {
            Some(g) => {
                let idx = self.geometry.shape.index(g);
                !std::mem::replace(&mut self.explored[idx], true)
            }
            None => false,
        };
        let new_belief = !self.visited.contains(&self.map_pose);
        if new_belief {
            self.visited.push(self.map_pose);
        }

        debug!(
            "[Session] step {}: MAP {:?}, truth {:?}, entropy {:.3} -> {:.3}",
            self.step, self.map_pose, truth_grid, entropy_before, entropy
        );
        Ok(Fusion {
            likelihood,
            ground_truth_likelihood: ground_truth,
            entropy_before,
            entropy,
            map_pose: self.map_pose,
            truth_grid,
            new_pose,
            new_belief,
        })
    }

    /// Whether the live scan shows an obstacle within one forward step.
    pub fn forward_blocked(&self, scan: &RangeScan) -> bool {
        let stack = ScanImageStack::render(
            scan,
            1,
            self.map.rows(),
            self.map.cols(),
            self.map.x_limits(),
            self.map.y_limits(),
        );
        let (front, side) = SlideMap::margins(
            self.config.collision_radius,
            self.forward_step_m,
            self.map.pixel_size(),
        );
        SlideMap::from_stack(&stack, front, side).forward_blocked()
    }

    /// Choose the next action by entropy lookahead from the believed pose.
    pub fn decide(
        &mut self,
        scan: &RangeScan,
        provider: Option<&dyn LikelihoodProvider>,
    ) -> Result<ActionDecision> {
        let blocked = self.forward_blocked(scan);
        let observation = Observation {
            map: &self.map,
            table: &self.table,
            source: self.config.source,
            provider,
        };
        self.selector
            .select(&observation, &self.belief, &self.believed, blocked)
    }

    /// Apply the executed motion: on a collision the belief and truth stay
    /// put, otherwise the belief is transitioned and the truth replaced.
    pub fn apply_motion(&mut self, action: Action, outcome: &MotionOutcome) {
        if outcome.collided {
            self.collisions += 1;
            debug!("[Session] {} collided, motion skipped", action);
            return;
        }
        self.transition.apply(Arc::make_mut(&mut self.belief), action);
        self.truth = outcome.truth;
    }

    /// Count the current step as done
    pub fn complete_step(&mut self) {
        self.step += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GridLimits;
    use crate::sensor::{BuildOptions, CancelToken, NoiseGenerator, cast_scan};
    use approx::assert_relative_eq;

    fn scan_options() -> ScanOptions {
        ScanOptions {
            max_range: 3.0,
            rays: 72,
            step: 0.02,
            step_jitter: 0.0,
            ..ScanOptions::default()
        }
    }

    /// 60x60 px over 3 m with a rim and an off-centre block, 3x3 grid
    fn fixture() -> (Arc<OccupancyMap>, Arc<ReferenceScanTable>) {
        let n = 60;
        let mut cells = vec![0.0; n * n];
        for i in 0..n {
            cells[i] = 1.0;
            cells[i * n] = 1.0;
            cells[(n - 1) * n + i] = 1.0;
            cells[i * n + n - 1] = 1.0;
        }
        for r in 42..48 {
            for c in 42..55 {
                cells[r * n + c] = 1.0;
            }
        }
        let lim = GridLimits::new(-1.5, 1.5);
        let map = OccupancyMap::from_cells(n, n, lim, lim, cells, 3, 3).unwrap();
        let table = ReferenceScanTable::build(
            &map,
            &scan_options(),
            BuildOptions::default(),
            &CancelToken::new(),
        )
        .unwrap();
        (Arc::new(map), Arc::new(table))
    }

    fn session() -> LocalizationSession {
        let (map, table) = fixture();
        let config = SessionConfig {
            scan: scan_options(),
            collision_radius: 0.1,
            seed: 9,
            ..SessionConfig::default()
        };
        LocalizationSession::new(config, map, table, Pose::new(0.0, -1.0, -1.0)).unwrap()
    }

    fn live_scan(s: &LocalizationSession) -> RangeScan {
        cast_scan(&s.truth(), s.map(), &scan_options(), &mut NoiseGenerator::new(1))
    }

    #[test]
    fn test_starts_uniform() {
        let s = session();
        assert_relative_eq!(s.belief().entropy(), 36f64.ln(), epsilon = 1e-9);
        assert_eq!(s.step(), 0);
        assert_eq!(s.truth_grid(), Some(GridPose::new(0, 0, 0)));
    }

    #[test]
    fn test_rejects_foreign_table() {
        let (map, _) = fixture();
        let table = Arc::new(
            ReferenceScanTable::from_parts(3, 3, 72, 0.1, 3.0, 1, vec![1.0; 3 * 3 * 72]).unwrap(),
        );
        let result =
            LocalizationSession::new(SessionConfig::default(), map, table, Pose::default());
        assert!(matches!(result, Err(LocalizationError::Configuration(_))));
    }

    #[test]
    fn test_observe_localizes_and_books() {
        let mut s = session();
        let scan = live_scan(&s);
        let fusion = s.observe(&scan, None).unwrap();
        assert!(fusion.entropy < fusion.entropy_before);
        assert_relative_eq!(s.belief().sum(), 1.0, epsilon = 1e-9);
        assert!(fusion.new_pose);
        assert!(fusion.new_belief);
        assert_eq!(s.poses_explored(), 1);

        let again = s.observe(&scan, None).unwrap();
        assert!(!again.new_pose);
        assert_eq!(s.poses_explored(), 1);
    }

    #[test]
    fn test_snapshot_is_stable() {
        let mut s = session();
        let before = s.belief();
        let copy = (*before).clone();
        let scan = live_scan(&s);
        s.observe(&scan, None).unwrap();
        assert_eq!(*before, copy);
        assert_ne!(*s.belief(), copy);
    }

    #[test]
    fn test_collision_skips_transition() {
        let mut s = session();
        let scan = live_scan(&s);
        s.observe(&scan, None).unwrap();
        let belief = s.belief();
        let truth = s.truth();
        s.apply_motion(
            Action::GoForward,
            &MotionOutcome {
                truth: Pose::new(0.0, 5.0, 5.0),
                collided: true,
            },
        );
        s.complete_step();
        assert_eq!(*s.belief(), *belief);
        assert_eq!(s.truth(), truth);
        assert_eq!(s.collisions(), 1);
        assert_eq!(s.step(), 1);
    }

    #[test]
    fn test_reset_clears_episode_state() {
        let mut s = session();
        let scan = live_scan(&s);
        s.observe(&scan, None).unwrap();
        s.complete_step();
        s.reset(Pose::new(0.0, 1.0, 1.0));
        assert_eq!(s.step(), 0);
        assert_eq!(s.poses_explored(), 0);
        assert_relative_eq!(s.belief().entropy(), 36f64.ln(), epsilon = 1e-9);
    }

    #[test]
    fn test_forward_blocked_near_wall() {
        let s = session();
        // Facing the rim from 0.1 m away
        let near = Pose::new(std::f64::consts::PI, -1.3, 0.0);
        let scan = cast_scan(&near, s.map(), &scan_options(), &mut NoiseGenerator::new(1));
        assert!(s.forward_blocked(&scan));
        // Facing open space
        let open = Pose::new(0.0, -1.0, -1.0);
        let scan = cast_scan(&open, s.map(), &scan_options(), &mut NoiseGenerator::new(1));
        assert!(!s.forward_blocked(&scan));
    }
}
