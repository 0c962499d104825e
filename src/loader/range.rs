use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use std::fmt;

/// Inclusive window of tracker timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start > end {
            bail!("time range start {} is after end {}", start, end);
        }
        Ok(Self { start, end })
    }

    /// Smallest range covering every timestamp, or `None` for an empty input.
    pub fn spanning<I>(timestamps: I) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveDateTime>,
    {
        timestamps.into_iter().fold(None, |acc, ts| match acc {
            None => Some(Self { start: ts, end: ts }),
            Some(r) => Some(Self {
                start: r.start.min(ts),
                end: r.end.max(ts),
            }),
        })
    }

    /// Replace either bound, keeping the other.
    pub fn narrowed(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Self> {
        Self::new(start.unwrap_or(self.start), end.unwrap_or(self.end))
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.start, self.end)
    }
}
