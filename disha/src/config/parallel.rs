//! Reference table build section.

use serde::{Deserialize, Serialize};

use crate::sensor::BuildOptions;

/// Worker pool settings
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParallelSection {
    /// Dedicated worker threads (0 = global rayon pool)
    #[serde(default)]
    pub workers: usize,

    /// Jitter stream seed (0 = derive from the map identity)
    #[serde(default)]
    pub seed: u64,
}

impl ParallelSection {
    /// Convert to build options
    pub fn to_build_options(&self) -> BuildOptions {
        BuildOptions {
            workers: self.workers,
            seed: self.seed,
        }
    }
}
