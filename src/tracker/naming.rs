/// Maps a tracker URL to the name its extracted data file has on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNaming {
    pub archive_extension: String,
    pub data_extension: String,
}

impl Default for FileNaming {
    fn default() -> Self {
        Self {
            archive_extension: ".zip".to_string(),
            data_extension: ".CSV".to_string(),
        }
    }
}

impl FileNaming {
    /// Last path segment of `url`, with the archive extension (any case)
    /// swapped for the data extension.
    pub fn file_name(&self, url: &str) -> String {
        let segment = url.rsplit('/').next().unwrap_or(url);

        let lower = segment.to_ascii_lowercase();
        let ext = self.archive_extension.to_ascii_lowercase();
        if !ext.is_empty() && lower.ends_with(&ext) {
            if let Some(stem) = segment.get(..segment.len() - ext.len()) {
                return format!("{}{}", stem, self.data_extension);
            }
        }
        segment.to_string()
    }

    /// Whether `name` carries the data extension (any case).
    pub fn is_data_file(&self, name: &str) -> bool {
        name.to_ascii_lowercase()
            .ends_with(&self.data_extension.to_ascii_lowercase())
    }
}
