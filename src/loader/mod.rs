// src/loader/mod.rs
pub mod range;
pub mod selection;

pub use range::TimeRange;
pub use selection::ReadSelection;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::{
    collections::{BTreeMap, HashSet},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::process::{read_nem_csv_with, NemTable, SplitOptions};
use crate::tracker::{Extractor, FileNaming};

/// A downloaded resource and the data file it should have produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableFile {
    pub timestamp: NaiveDateTime,
    pub file: String,
}

/// Outcome of [`Loader::refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub tracked: usize,
    pub downloaded: usize,
    pub listed: usize,
    /// Tracker-derived names equal the directory listing, in order.
    pub consistent: bool,
}

/// Stateful session over an [`Extractor`]: which files exist, which to read
/// next, and loading them into tables.
#[derive(Debug)]
pub struct Loader<E: Extractor> {
    extractor: E,
    naming: FileNaming,
    split: SplitOptions,
    available_files: Vec<AvailableFile>,
    listed_files: Vec<String>,
    time_range: Option<TimeRange>,
    read_list: Vec<String>,
}

impl<E: Extractor> Loader<E> {
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            naming: FileNaming::default(),
            split: SplitOptions::default(),
            available_files: Vec::new(),
            listed_files: Vec::new(),
            time_range: None,
            read_list: Vec::new(),
        }
    }

    pub fn with_naming(mut self, naming: FileNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_split_options(mut self, split: SplitOptions) -> Self {
        self.split = split;
        self
    }

    /// Reload the tracker, derive the expected data files of every downloaded
    /// record, reset the time range to span them, and list the data files of the
    /// resource directory. A mismatch between the two is only warned about.
    #[tracing::instrument(level = "info", skip(self), fields(dir = %self.extractor.resource_dir().display()))]
    pub fn refresh(&mut self) -> Result<RefreshReport> {
        self.extractor
            .load_tracker()
            .context("reloading tracker")?;

        let tracker = self.extractor.tracker();
        let available: Vec<AvailableFile> = tracker
            .iter()
            .filter(|r| r.downloaded)
            .map(|r| AvailableFile {
                timestamp: r.timestamp,
                file: self.naming.file_name(&r.url),
            })
            .collect();
        let tracked = tracker.len();

        let mut listed = self
            .extractor
            .list_resources()
            .context("listing resource directory")?;
        let before = listed.len();
        listed.retain(|name| self.naming.is_data_file(name));
        if listed.len() < before {
            debug!(skipped = before - listed.len(), "ignoring non-data files in resource directory");
        }

        self.time_range = TimeRange::spanning(available.iter().map(|f| f.timestamp));
        self.available_files = available;
        self.listed_files = listed;

        // order-sensitive; archive trackers never line up
        let consistent = self
            .available_files
            .iter()
            .map(|f| f.file.as_str())
            .eq(self.listed_files.iter().map(String::as_str));
        if !consistent {
            warn!(
                expected = self.available_files.len(),
                listed = self.listed_files.len(),
                "inconsistency detected in file records"
            );
            self.log_differences();
        }

        let report = RefreshReport {
            tracked,
            downloaded: self.available_files.len(),
            listed: self.listed_files.len(),
            consistent,
        };
        info!(
            tracked = report.tracked,
            downloaded = report.downloaded,
            listed = report.listed,
            range = ?self.time_range,
            "refreshed available files"
        );
        Ok(report)
    }

    fn log_differences(&self) {
        let expected: HashSet<&str> = self.available_files.iter().map(|f| f.file.as_str()).collect();
        let listed: HashSet<&str> = self.listed_files.iter().map(String::as_str).collect();

        let mut missing: Vec<&str> = expected.difference(&listed).copied().collect();
        let mut untracked: Vec<&str> = listed.difference(&expected).copied().collect();
        missing.sort_unstable();
        untracked.sort_unstable();
        debug!(?missing, ?untracked, "file record differences");
    }

    /// Choose the files the next [`Loader::load`] reads, and return them.
    pub fn select(&mut self, selection: ReadSelection) -> &[String] {
        let read_list = match selection {
            ReadSelection::ByTimeRange => match self.time_range {
                Some(range) => self
                    .available_files
                    .iter()
                    .filter(|f| range.contains(f.timestamp))
                    .map(|f| f.file.clone())
                    .collect(),
                None => Vec::new(),
            },
            ReadSelection::Manual(files) => files,
            ReadSelection::All => self.listed_files.clone(),
            ReadSelection::Latest(n) => {
                let skip = self.listed_files.len().saturating_sub(n);
                self.listed_files[skip..].to_vec()
            }
        };
        debug!(files = read_list.len(), "read list selected");
        self.read_list = read_list;
        &self.read_list
    }

    /// Split every file of the read list, keyed by file name.
    ///
    /// The first file that cannot be opened or parsed aborts the load.
    pub fn load(&self) -> Result<BTreeMap<String, Vec<NemTable>>> {
        let dir = self.extractor.resource_dir();
        let mut out = BTreeMap::new();
        for name in &self.read_list {
            let start = Instant::now();
            let tables = read_nem_csv_with(dir.join(name), &self.split)
                .with_context(|| format!("loading {}", name))?;
            info!(file = %name, tables = tables.len(), elapsed = ?start.elapsed(), "loaded");
            out.insert(name.clone(), tables);
        }
        Ok(out)
    }

    pub fn set_time_range(&mut self, range: TimeRange) {
        self.time_range = Some(range);
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        self.time_range
    }

    pub fn available_files(&self) -> &[AvailableFile] {
        &self.available_files
    }

    pub fn listed_files(&self) -> &[String] {
        &self.listed_files
    }

    pub fn read_list(&self) -> &[String] {
        &self.read_list
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn extractor_mut(&mut self) -> &mut E {
        &mut self.extractor
    }
}
