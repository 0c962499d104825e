// src/process/mod.rs
pub mod table;
pub mod utils;

pub use table::NemTable;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::{
    fs::File,
    io::{BufReader, Read},
    ops::Range,
    path::Path,
};
use tracing::{debug, trace, warn};

/// Row-type marker of a sub-table's header row.
pub const DEFAULT_SENTINEL: &str = "I";
/// Row-type marker of the comment rows AEMO puts at the top and bottom of a file.
pub const FOOTER_MARKER: &str = "C";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    /// Column-0 value that opens a new sub-table.
    pub sentinel: String,
    /// Infer Int64/Float64 columns; otherwise everything stays Utf8.
    pub infer_types: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
            infer_types: true,
        }
    }
}

/// Record indices of one sub-table: the header row, and the exclusive end of its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub header: usize,
    pub end: usize,
}

impl Segment {
    pub fn data_rows(&self) -> Range<usize> {
        self.header + 1..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.header - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn row_label(record: &StringRecord) -> Option<&str> {
    record.get(0).map(str::trim)
}

/// Indices of every record whose column 0 equals `sentinel`.
pub fn sentinel_rows(records: &[StringRecord], sentinel: &str) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| row_label(r) == Some(sentinel))
        .map(|(i, _)| i)
        .collect()
}

fn is_comment(record: &StringRecord) -> bool {
    row_label(record) == Some(FOOTER_MARKER)
}

/// Pair each sentinel row with the end of its segment.
///
/// A segment runs up to the next sentinel; the last one runs to end of input,
/// less the trailing run of `C` footer rows.
pub fn segment_bounds(records: &[StringRecord], sentinel: &str) -> Vec<Segment> {
    let starts = sentinel_rows(records, sentinel);
    let footer_start = records.len()
        - records
            .iter()
            .rev()
            .take_while(|r| is_comment(r))
            .count();

    starts
        .iter()
        .enumerate()
        .map(|(n, &header)| {
            let end = match starts.get(n + 1) {
                Some(&next) => next,
                None => footer_start.max(header + 1),
            };
            Segment { header, end }
        })
        .collect()
}

/// Split any CSV reader into its sub-tables. `name` is only used in errors and logs.
pub fn parse_nem_csv<R: Read>(reader: R, name: &str, opts: &SplitOptions) -> Result<Vec<NemTable>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let records = rdr
        .records()
        .enumerate()
        .map(|(idx, rec)| rec.with_context(|| format!("CSV parse error in {} at record {}", name, idx)))
        .collect::<Result<Vec<_>>>()?;

    let segments = segment_bounds(&records, &opts.sentinel);
    if segments.is_empty() {
        debug!(file = %name, records = records.len(), "no sentinel rows");
        return Ok(Vec::new());
    }

    segments
        .iter()
        .map(|seg| {
            let data = &records[seg.data_rows()];
            let comments = data.iter().filter(|r| is_comment(r)).count();
            let built = if comments == 0 {
                NemTable::from_records(&records[seg.header], data, opts.infer_types)
            } else {
                warn!(file = %name, header = seg.header, comments, "skipping C rows inside table");
                let kept: Vec<StringRecord> =
                    data.iter().filter(|r| !is_comment(r)).cloned().collect();
                NemTable::from_records(&records[seg.header], &kept, opts.infer_types)
            };
            let table = built
                .with_context(|| format!("building table in {} at record {}", name, seg.header))?;
            trace!(
                file = %name,
                table = %table.id,
                header = seg.header,
                rows = seg.len(),
                "split segment"
            );
            Ok(table)
        })
        .collect()
}

/// Read a NEM CSV from disk and return its sub-tables in file order.
#[tracing::instrument(level = "debug", skip(path, opts), fields(path = %path.as_ref().display()))]
pub fn read_nem_csv_with<P: AsRef<Path>>(path: P, opts: &SplitOptions) -> Result<Vec<NemTable>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let tables = parse_nem_csv(BufReader::new(file), &name, opts)?;
    debug!(tables = tables.len(), "split file");
    Ok(tables)
}

/// [`read_nem_csv_with`] using the “I” sentinel and type inference.
pub fn read_nem_csv<P: AsRef<Path>>(path: P) -> Result<Vec<NemTable>> {
    read_nem_csv_with(path, &SplitOptions::default())
}
