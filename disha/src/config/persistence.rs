//! Persistence configuration section.

use serde::{Deserialize, Serialize};

use crate::io::ReferenceTableCache;

use super::defaults;

/// Reference table cache settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistenceSection {
    /// Cache directory
    #[serde(default = "defaults::cache_dir")]
    pub cache_dir: String,

    /// Load and store reference tables in `cache_dir`
    #[serde(default)]
    pub use_cache: bool,
}

impl Default for PersistenceSection {
    fn default() -> Self {
        Self {
            cache_dir: "./cache".to_string(),
            use_cache: false,
        }
    }
}

impl PersistenceSection {
    /// Cache, if enabled
    pub fn cache(&self) -> Option<ReferenceTableCache> {
        self.use_cache
            .then(|| ReferenceTableCache::new(self.cache_dir.as_str()))
    }
}
