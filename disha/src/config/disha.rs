//! Main DishaConfig and conversion methods.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::map::MazeGenerator;
use crate::session::{
    ControllerConfig, SessionConfig, SimulatedRangeSensor, TeleportConfig, TeleportExecutor,
};

use super::episode::EpisodeSection;
use super::error::ConfigLoadError;
use super::grid::GridSection;
use super::likelihood::LikelihoodSection;
use super::maze::MazeSection;
use super::motion::MotionSection;
use super::parallel::ParallelSection;
use super::persistence::PersistenceSection;
use super::sensor::SensorSection;

/// Noise streams derived from `episode.seed`
const MAZE_STREAM: u64 = 2;
const EXECUTOR_STREAM: u64 = 4;
const SENSOR_STREAM: u64 = 5;

/// Full Disha configuration loaded from YAML
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DishaConfig {
    /// Grid and map extent
    #[serde(default)]
    pub grid: GridSection,

    /// Simulated lidar
    #[serde(default)]
    pub sensor: SensorSection,

    /// Likelihood builder
    #[serde(default)]
    pub likelihood: LikelihoodSection,

    /// Motion model and executor
    #[serde(default)]
    pub motion: MotionSection,

    /// Budgets, placement, seed
    #[serde(default)]
    pub episode: EpisodeSection,

    /// Procedural maps
    #[serde(default)]
    pub maze: MazeSection,

    /// Reference table build
    #[serde(default)]
    pub parallel: ParallelSection,

    /// Reference table cache
    #[serde(default)]
    pub persistence: PersistenceSection,
}

impl DishaConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Load from default config path (configs/config.yaml)
    pub fn load_default() -> Result<Self, ConfigLoadError> {
        let path = Path::new("configs/config.yaml");
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigLoadError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-section constraints
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        self.grid.validate()?;
        if self.sensor.rays == 0 {
            return Err(ConfigLoadError::Invalid("sensor.rays is zero".to_string()));
        }
        if self.sensor.min_range >= self.sensor.max_range {
            return Err(ConfigLoadError::Invalid(format!(
                "sensor range [{}, {}] is empty",
                self.sensor.min_range, self.sensor.max_range
            )));
        }
        if self.likelihood.temperature <= 0.0 {
            return Err(ConfigLoadError::Invalid(
                "likelihood.temperature must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Convert to per-session settings
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            headings: self.grid.headings,
            scan: self.sensor.to_scan_options(),
            likelihood: self.likelihood.to_likelihood_config(self.grid.headings),
            source: self.likelihood.source,
            transition: self.motion.to_transition_config(),
            collision_radius: self.motion.collision_radius,
            seed: self.episode.seed,
        }
    }

    /// Convert to controller settings
    pub fn to_controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            session: self.to_session_config(),
            field: self.grid.to_field_spec(),
            budget: self.episode.to_episode_config(),
            placement: self
                .episode
                .to_placement_config(self.motion.collision_radius),
            build: self.parallel.to_build_options(),
        }
    }

    /// Convert to teleport executor settings
    pub fn to_teleport_config(&self) -> TeleportConfig {
        TeleportConfig {
            forward_step_m: self.motion.forward_step as f64 * self.grid.cell_size_x(),
            rotation_step: self.motion.rotation_step,
            headings: self.grid.headings,
            noise_xy: self.motion.process_noise_xy,
            noise_theta: self.motion.process_noise_theta,
            collision_radius: self.motion.collision_radius,
        }
    }

    /// Seeded map generator
    pub fn maze_generator(&self) -> MazeGenerator {
        MazeGenerator::new(
            self.maze.to_maze_config(),
            self.episode.stream_seed(MAZE_STREAM),
        )
    }

    /// Seeded teleport executor
    pub fn teleport_executor(&self) -> TeleportExecutor {
        TeleportExecutor::new(
            self.to_teleport_config(),
            self.episode.stream_seed(EXECUTOR_STREAM),
        )
    }

    /// Seeded simulated lidar
    pub fn range_sensor(&self) -> SimulatedRangeSensor {
        SimulatedRangeSensor::new(
            self.sensor.to_scan_options(),
            self.episode.stream_seed(SENSOR_STREAM),
        )
    }
}
