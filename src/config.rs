use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::loader::{ReadSelection, TimeRange};
use crate::process::{SplitOptions, FOOTER_MARKER};
use crate::tracker::{parse_timestamp, FileNaming};

pub const DATA_DIR_ENV: &str = "NEMLOADER_DATA_DIR";
pub const TRACKER_ENV: &str = "NEMLOADER_TRACKER";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Resource directory holding the extracted data files.
    pub data_dir: PathBuf,
    /// Tracker CSV maintained by the downloader.
    pub tracker: PathBuf,
    pub sentinel: String,
    pub infer_types: bool,
    pub archive_extension: String,
    pub data_extension: String,
    pub select: SelectConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let naming = FileNaming::default();
        let split = SplitOptions::default();
        Self {
            data_dir: PathBuf::from("data/resources"),
            tracker: PathBuf::from("data/tracker.csv"),
            sentinel: split.sentinel,
            infer_types: split.infer_types,
            archive_extension: naming.archive_extension,
            data_extension: naming.data_extension,
            select: SelectConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectMode {
    #[default]
    Latest,
    All,
    Range,
    Manual,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectConfig {
    pub mode: SelectMode,
    pub latest: usize,
    pub files: Vec<String>,
    /// Optional bounds narrowing the tracker-derived time range.
    pub start: Option<String>,
    pub end: Option<String>,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            mode: SelectMode::Latest,
            latest: 1,
            files: Vec::new(),
            start: None,
            end: None,
        }
    }
}

impl SelectConfig {
    pub fn selection(&self) -> ReadSelection {
        match self.mode {
            SelectMode::Latest => ReadSelection::Latest(self.latest),
            SelectMode::All => ReadSelection::All,
            SelectMode::Range => ReadSelection::ByTimeRange,
            SelectMode::Manual => ReadSelection::Manual(self.files.clone()),
        }
    }

    pub fn bounds(&self) -> Result<(Option<NaiveDateTime>, Option<NaiveDateTime>)> {
        Ok((parse_bound("start", &self.start)?, parse_bound("end", &self.end)?))
    }

    /// Apply the configured bounds to `current`. `None` when nothing is configured;
    /// with no current range both bounds are required.
    pub fn range_override(&self, current: Option<TimeRange>) -> Result<Option<TimeRange>> {
        match (self.bounds()?, current) {
            ((None, None), _) => Ok(None),
            ((start, end), Some(range)) => range.narrowed(start, end).map(Some),
            ((Some(start), Some(end)), None) => TimeRange::new(start, end).map(Some),
            _ => bail!("select.start and select.end are both required when the tracker has no downloaded files"),
        }
    }
}

fn parse_bound(name: &str, raw: &Option<String>) -> Result<Option<NaiveDateTime>> {
    match raw {
        None => Ok(None),
        Some(s) => match parse_timestamp(s) {
            Some(ts) => Ok(Some(ts)),
            None => bail!("select.{}: unparseable timestamp {:?}", name, s),
        },
    }
}

impl LoaderConfig {
    /// Read `path` if it exists, otherwise fall back to defaults. Always validated.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            Self::from_yaml(&text)
                .with_context(|| format!("failed to parse yaml in {}", path.display()))?
        } else {
            info!(path = %path.display(), "no config file; using defaults");
            Self::default()
        };
        config
            .validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Replace the paths with `NEMLOADER_DATA_DIR` / `NEMLOADER_TRACKER` when set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var_os(DATA_DIR_ENV).map(PathBuf::from),
            std::env::var_os(TRACKER_ENV).map(PathBuf::from),
        )
    }

    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, tracker: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(tracker) = tracker {
            self.tracker = tracker;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let sentinel = self.sentinel.trim();
        if sentinel.is_empty() {
            bail!("sentinel must not be empty");
        }
        if sentinel == FOOTER_MARKER {
            bail!("sentinel must differ from the footer marker {:?}", FOOTER_MARKER);
        }
        for (name, ext) in [
            ("archive_extension", &self.archive_extension),
            ("data_extension", &self.data_extension),
        ] {
            if !ext.starts_with('.') || ext.len() < 2 {
                bail!("{} must look like `.ext`, got {:?}", name, ext);
            }
        }
        if self.select.mode == SelectMode::Latest && self.select.latest == 0 {
            bail!("select.latest must be at least 1");
        }
        if self.select.mode == SelectMode::Manual && self.select.files.is_empty() {
            bail!("select.files must not be empty for manual mode");
        }
        if let (Some(start), Some(end)) = self.select.bounds()? {
            if start > end {
                bail!("select.start {} is after select.end {}", start, end);
            }
        }
        Ok(())
    }

    pub fn naming(&self) -> FileNaming {
        FileNaming {
            archive_extension: self.archive_extension.clone(),
            data_extension: self.data_extension.clone(),
        }
    }

    pub fn split_options(&self) -> SplitOptions {
        SplitOptions {
            sentinel: self.sentinel.trim().to_string(),
            infer_types: self.infer_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn full_yaml() -> Result<()> {
        let config = LoaderConfig::from_yaml(
            r#"
data_dir: nem/resources
tracker: nem/tracker.csv
sentinel: I
infer_types: false
archive_extension: .zip
data_extension: .csv
select:
  mode: range
  start: "2024-12-14 00:10:00"
"#,
        )?;
        config.validate()?;
        assert_eq!(config.data_dir, PathBuf::from("nem/resources"));
        assert!(!config.infer_types);
        assert_eq!(config.naming().data_extension, ".csv");
        assert_eq!(config.select.selection(), ReadSelection::ByTimeRange);
        assert_eq!(config.select.bounds()?, (Some(at(0, 10)), None));
        Ok(())
    }

    #[test]
    fn empty_yaml_is_defaults() -> Result<()> {
        let config = LoaderConfig::from_yaml("{}")?;
        assert_eq!(config, LoaderConfig::default());
        assert_eq!(config.select.selection(), ReadSelection::Latest(1));
        assert_eq!(config.split_options(), SplitOptions::default());
        Ok(())
    }

    #[test]
    fn validation_errors() -> Result<()> {
        let cases = [
            "sentinel: ''",
            "sentinel: C",
            "data_extension: CSV",
            "select: {mode: latest, latest: 0}",
            "select: {mode: manual}",
            "select: {start: '2024-12-14 01:00:00', end: '2024-12-14 00:00:00'}",
            "select: {start: whenever}",
        ];
        for case in cases {
            let config = LoaderConfig::from_yaml(case)?;
            assert!(config.validate().is_err(), "{} should be rejected", case);
        }
        assert!(LoaderConfig::from_yaml("select: {mode: newest}").is_err());
        Ok(())
    }

    #[test]
    fn range_override() -> Result<()> {
        let current = TimeRange::new(at(0, 5), at(0, 20))?;

        let none = SelectConfig::default();
        assert_eq!(none.range_override(Some(current))?, None);

        let start_only = SelectConfig {
            start: Some("2024-12-14 00:10:00".to_string()),
            ..SelectConfig::default()
        };
        assert_eq!(
            start_only.range_override(Some(current))?,
            Some(TimeRange::new(at(0, 10), at(0, 20))?)
        );
        assert!(start_only.range_override(None).is_err());

        let both = SelectConfig {
            end: Some("2024-12-14 00:15:00".to_string()),
            ..start_only
        };
        assert_eq!(
            both.range_override(None)?,
            Some(TimeRange::new(at(0, 10), at(0, 15))?)
        );
        Ok(())
    }

    #[test]
    fn load_reads_file_or_defaults() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("nemloader.yaml");
        assert_eq!(LoaderConfig::load(&path)?, LoaderConfig::default());

        fs::write(&path, "select:\n  mode: all\n")?;
        assert_eq!(LoaderConfig::load(&path)?.select.selection(), ReadSelection::All);

        fs::write(&path, "select:\n  mode: latest\n  latest: 0\n")?;
        assert!(LoaderConfig::load(&path).is_err());
        Ok(())
    }

    #[test]
    fn overrides_replace_paths() {
        let config = LoaderConfig::default()
            .with_overrides(Some(PathBuf::from("/srv/nem")), None);
        assert_eq!(config.data_dir, PathBuf::from("/srv/nem"));
        assert_eq!(config.tracker, PathBuf::from("data/tracker.csv"));
    }
}
