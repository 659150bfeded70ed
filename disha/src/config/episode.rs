//! Episode configuration section.

use serde::{Deserialize, Serialize};

use crate::session::{EpisodeConfig, InitError, PlacementConfig};

use super::defaults;

/// Run budgets, placement and seeding
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSection {
    /// Maps to run
    #[serde(default = "defaults::one")]
    pub environments: usize,

    /// Episodes per map
    #[serde(default = "defaults::episodes")]
    pub episodes: usize,

    /// Steps per episode
    #[serde(default = "defaults::steps")]
    pub steps: usize,

    /// Truth perturbation inside the start cell
    #[serde(default)]
    pub init_error: InitError,

    /// Start samples before giving up
    #[serde(default = "defaults::placement_attempts")]
    pub placement_attempts: usize,

    /// Base seed (0 = entropy)
    #[serde(default)]
    pub seed: u64,
}

impl Default for EpisodeSection {
    fn default() -> Self {
        Self {
            environments: 1,
            episodes: 10,
            steps: 10,
            init_error: InitError::None,
            placement_attempts: 100,
            seed: 0,
        }
    }
}

impl EpisodeSection {
    /// Convert to controller budgets
    pub fn to_episode_config(&self) -> EpisodeConfig {
        EpisodeConfig {
            environments: self.environments,
            episodes: self.episodes,
            steps: self.steps,
        }
    }

    /// Convert to placement settings for a robot of `collision_radius`
    pub fn to_placement_config(&self, collision_radius: f64) -> PlacementConfig {
        PlacementConfig {
            collision_radius,
            attempts: self.placement_attempts,
            init_error: self.init_error,
        }
    }

    /// Seed of an independent noise stream; 0 stays 0
    pub fn stream_seed(&self, stream: u64) -> u64 {
        if self.seed == 0 {
            0
        } else {
            self.seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        }
    }
}
