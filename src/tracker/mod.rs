// src/tracker/mod.rs

//! The extractor seam: whatever downloads NEM files also keeps a tracker of
//! what it fetched. This crate only reads that tracker and the directory the
//! files were saved to.

pub mod file;
pub mod memory;
pub mod naming;

pub use file::TrackerFile;
pub use memory::MemoryExtractor;
pub use naming::FileNaming;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use glob::{glob, Pattern};
use std::path::Path;

/// One remote resource known to the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerRecord {
    pub url: String,
    pub timestamp: NaiveDateTime,
    pub downloaded: bool,
}

impl TrackerRecord {
    pub fn new(url: impl Into<String>, timestamp: NaiveDateTime, downloaded: bool) -> Self {
        Self {
            url: url.into(),
            timestamp,
            downloaded,
        }
    }
}

/// Source of the tracker table and the local resource directory.
pub trait Extractor {
    /// Reload the tracker table from wherever the extractor keeps it.
    fn load_tracker(&mut self) -> Result<()>;

    /// The tracker table as of the last [`Extractor::load_tracker`].
    fn tracker(&self) -> &[TrackerRecord];

    /// Directory holding the downloaded data files.
    fn resource_dir(&self) -> &Path;

    /// File names present in [`Extractor::resource_dir`], sorted by name.
    fn list_resources(&self) -> Result<Vec<String>> {
        list_dir_files(self.resource_dir())
    }
}

/// Names of the regular files directly under `dir`, sorted.
pub fn list_dir_files(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        bail!(
            "resource_dir `{}` does not exist or is not a directory",
            dir.display()
        );
    }

    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    let mut names = Vec::new();
    for entry in glob(&pattern).context("invalid glob pattern for resource directory")? {
        let path = entry.with_context(|| format!("reading entry in {}", dir.display()))?;
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y%m%d%H%M%S",
    "%Y%m%d%H%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Parse a tracker timestamp. Bare dates map to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim().trim_matches('"');
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a tracker `DOWNLOADED` flag.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "t" => Some(true),
        "false" | "0" | "no" | "n" | "f" | "" => Some(false),
        _ => None,
    }
}
