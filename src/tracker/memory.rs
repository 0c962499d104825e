use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{Extractor, TrackerRecord};

/// Extractor whose tracker lives in memory. Changes made with
/// [`MemoryExtractor::push`] become visible on the next `load_tracker`.
#[derive(Debug, Clone, Default)]
pub struct MemoryExtractor {
    resource_dir: PathBuf,
    pending: Vec<TrackerRecord>,
    loaded: Vec<TrackerRecord>,
    loads: usize,
}

impl MemoryExtractor {
    pub fn new(resource_dir: impl Into<PathBuf>, records: Vec<TrackerRecord>) -> Self {
        Self {
            resource_dir: resource_dir.into(),
            pending: records,
            loaded: Vec::new(),
            loads: 0,
        }
    }

    pub fn push(&mut self, record: TrackerRecord) {
        self.pending.push(record);
    }

    /// How many times the tracker has been (re)loaded.
    pub fn loads(&self) -> usize {
        self.loads
    }
}

impl Extractor for MemoryExtractor {
    fn load_tracker(&mut self) -> Result<()> {
        self.loaded = self.pending.clone();
        self.loads += 1;
        Ok(())
    }

    fn tracker(&self) -> &[TrackerRecord] {
        &self.loaded
    }

    fn resource_dir(&self) -> &Path {
        &self.resource_dir
    }
}
