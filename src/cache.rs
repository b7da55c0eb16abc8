//! Per-slice cache used for resumable runs.
//!
//! A slice is addressed by station id and year. [`FsSliceCache`] keeps one CSV
//! per slice under a region's `parts/` directory; [`MemorySliceCache`] keeps
//! them in a map.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::observation::{OBSERVATION_COLUMNS, Observation};
use crate::output::tmp_sibling;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SliceKey {
    pub station_id: String,
    pub year: i32,
}

impl SliceKey {
    pub fn new(station_id: &str, year: i32) -> Self {
        Self {
            station_id: station_id.to_string(),
            year,
        }
    }

    /// `GHCND:USW00013876` in 2004 → `GHCND_USW00013876_2004.csv`
    pub fn file_name(&self) -> String {
        format!("{}_{}.csv", self.station_id.replace(':', "_"), self.year)
    }
}

pub trait SliceCache {
    /// Whether a result for `key` was persisted earlier (possibly empty).
    fn contains(&self, key: &SliceKey) -> bool;
    fn load(&self, key: &SliceKey) -> Result<Vec<Observation>>;
    fn store(&mut self, key: &SliceKey, rows: &[Observation]) -> Result<()>;
}

/// Slice cache backed by CSV files in one directory.
pub struct FsSliceCache {
    dir: PathBuf,
}

impl FsSliceCache {
    /// Opens (creating if needed) the cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating cache directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, key: &SliceKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl SliceCache for FsSliceCache {
    fn contains(&self, key: &SliceKey) -> bool {
        // A header-only file still counts: it records an empty slice.
        fs::metadata(self.path_for(key)).is_ok_and(|m| m.len() > 0)
    }

    fn load(&self, key: &SliceKey) -> Result<Vec<Observation>> {
        let path = self.path_for(key);
        let mut rdr = csv::Reader::from_path(&path)
            .with_context(|| format!("opening cached slice {}", path.display()))?;

        let mut rows = Vec::new();
        for result in rdr.deserialize() {
            let record: Observation =
                result.with_context(|| format!("reading cached slice {}", path.display()))?;
            rows.push(record);
        }
        debug!(path = %path.display(), rows = rows.len(), "Loaded cached slice");
        Ok(rows)
    }

    fn store(&mut self, key: &SliceKey, rows: &[Observation]) -> Result<()> {
        let path = self.path_for(key);
        let tmp = tmp_sibling(&path);
        write_observations(&tmp, rows)
            .with_context(|| format!("writing cached slice {}", tmp.display()))?;
        // Only a complete file ever appears under the final name.
        fs::rename(&tmp, &path)
            .with_context(|| format!("moving {} into place", path.display()))
    }
}

fn write_observations(path: &Path, rows: &[Observation]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(OBSERVATION_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// In-memory slice cache.
#[derive(Debug, Default)]
pub struct MemorySliceCache {
    entries: HashMap<SliceKey, Vec<Observation>>,
}

impl MemorySliceCache {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SliceCache for MemorySliceCache {
    fn contains(&self, key: &SliceKey) -> bool {
        self.entries.contains_key(key)
    }

    fn load(&self, key: &SliceKey) -> Result<Vec<Observation>> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("slice {} is not cached", key.file_name()))
    }

    fn store(&mut self, key: &SliceKey, rows: &[Observation]) -> Result<()> {
        self.entries.insert(key.clone(), rows.to_vec());
        Ok(())
    }
}
