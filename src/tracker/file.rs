use anyhow::{anyhow, bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::{
    fs::{self, File},
    io::{BufReader, Read},
    path::{Path, PathBuf},
};
use tracing::debug;

use super::{list_dir_files, parse_flag, parse_timestamp, Extractor, TrackerRecord};

/// Extractor backed by a tracker CSV written by the downloader.
///
/// The file needs `URL`, `TIMESTAMP` and `DOWNLOADED` columns (any order, any
/// case); other columns, such as a leading index column, are ignored.
#[derive(Debug, Clone)]
pub struct TrackerFile {
    path: PathBuf,
    resource_dir: PathBuf,
    records: Vec<TrackerRecord>,
}

impl TrackerFile {
    pub fn new(path: impl Into<PathBuf>, resource_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            resource_dir: resource_dir.into(),
            records: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Extractor for TrackerFile {
    fn load_tracker(&mut self) -> Result<()> {
        self.records = read_tracker_csv(&self.path)?;
        debug!(path = %self.path.display(), records = self.records.len(), "loaded tracker");
        Ok(())
    }

    fn tracker(&self) -> &[TrackerRecord] {
        &self.records
    }

    fn resource_dir(&self) -> &Path {
        &self.resource_dir
    }

    /// The directory listing, less the tracker file itself when it lives there.
    fn list_resources(&self) -> Result<Vec<String>> {
        let mut names = list_dir_files(&self.resource_dir)?;
        let tracker = fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        names.retain(|name| {
            let candidate = self.resource_dir.join(name);
            let candidate = fs::canonicalize(&candidate).unwrap_or(candidate);
            candidate != tracker
        });
        Ok(names)
    }
}

/// Read a tracker CSV from disk.
pub fn read_tracker_csv(path: &Path) -> Result<Vec<TrackerRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open tracker file: {:?}", path))?;
    parse_tracker(BufReader::new(file))
        .with_context(|| format!("Failed to read tracker file: {:?}", path))
}

/// Parse tracker rows from any CSV reader.
pub fn parse_tracker<R: Read>(reader: R) -> Result<Vec<TrackerRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("reading tracker header")?.clone();
    let url_col = column_index(&headers, "URL")?;
    let ts_col = column_index(&headers, "TIMESTAMP")?;
    let dl_col = column_index(&headers, "DOWNLOADED")?;

    let mut out = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        // header is line 1
        let line = idx + 2;
        let record = result.with_context(|| format!("CSV parse error at line {}", line))?;

        let url = record
            .get(url_col)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("line {}: missing URL", line))?;
        let raw_ts = record.get(ts_col).unwrap_or("");
        let timestamp = parse_timestamp(raw_ts)
            .ok_or_else(|| anyhow!("line {}: unparseable TIMESTAMP {:?}", line, raw_ts))?;
        let raw_flag = record.get(dl_col).unwrap_or("");
        let downloaded = parse_flag(raw_flag)
            .ok_or_else(|| anyhow!("line {}: unparseable DOWNLOADED {:?}", line, raw_flag))?;

        out.push(TrackerRecord::new(url, timestamp, downloaded));
    }
    Ok(out)
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    match headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
    {
        Some(idx) => Ok(idx),
        None => bail!("tracker is missing the {} column", name),
    }
}
