/// Which files the next load should read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadSelection {
    /// Tracked files whose timestamp falls inside the loader's time range.
    ByTimeRange,
    /// Exactly these file names.
    Manual(Vec<String>),
    /// Everything in the resource directory.
    All,
    /// The last `n` files of the resource directory listing.
    Latest(usize),
}

impl Default for ReadSelection {
    fn default() -> Self {
        ReadSelection::Latest(1)
    }
}
