//! On-disk reference table cache keyed by map identity.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::Result;
use crate::map::OccupancyMap;
use crate::sensor::{BuildOptions, CancelToken, ReferenceScanTable, ScanOptions};

use super::IoError;
use super::table_format::{load_table, save_table};

/// Directory of `{map_id:016x}.rtab` files.
#[derive(Clone, Debug)]
pub struct ReferenceTableCache {
    dir: PathBuf,
}

impl ReferenceTableCache {
    /// Cache rooted at `dir` (created on first store)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the table of map `map_id`
    pub fn path_for(&self, map_id: u64) -> PathBuf {
        self.dir.join(format!("{:016x}.rtab", map_id))
    }

    /// Cached table of `map` built with `options`.
    ///
    /// `Ok(None)` when nothing is cached or the stored table was built with
    /// other grid or sensor settings. A file whose identity differs from
    /// `map` is an error.
    pub fn load(
        &self,
        map: &OccupancyMap,
        options: &ScanOptions,
    ) -> std::result::Result<Option<ReferenceScanTable>, IoError> {
        let path = self.path_for(map.id());
        if !path.exists() {
            return Ok(None);
        }
        let table = load_table(&path)?;
        if table.map_id() != map.id() {
            return Err(IoError::MapMismatch {
                expected: map.id(),
                found: table.map_id(),
            });
        }
        let settings_match = (table.rows(), table.cols()) == map.grid_dims()
            && table.rays() == options.rays
            && table.range_bounds() == (options.min_range, options.max_range);
        if !settings_match {
            warn!(
                "[RefTable] cached table {} built with other settings, ignoring",
                path.display()
            );
            return Ok(None);
        }
        Ok(Some(table))
    }

    /// Write `table` into the cache
    pub fn store(&self, table: &ReferenceScanTable) -> std::result::Result<PathBuf, IoError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(table.map_id());
        save_table(table, &path)?;
        Ok(path)
    }

    /// Cached table if valid, otherwise build and store a new one.
    pub fn load_or_build(
        &self,
        map: &OccupancyMap,
        options: &ScanOptions,
        build: BuildOptions,
        cancel: &CancelToken,
    ) -> Result<ReferenceScanTable> {
        match self.load(map, options) {
            Ok(Some(table)) => {
                info!("[RefTable] cache hit for map {:016x}", map.id());
                return Ok(table);
            }
            Ok(None) => {}
            Err(e) => warn!("[RefTable] discarding cache entry: {}", e),
        }
        let table = ReferenceScanTable::build(map, options, build, cancel)?;
        let path = self.store(&table)?;
        info!("[RefTable] cached {}", path.display());
        Ok(table)
    }
}
