//! Load downloaded AEMO NEM market data files into Arrow tables.
//!
//! - [`process`] splits a multi-table NEM CSV into one table per “I” row.
//! - [`tracker`] is the seam to whatever downloaded the files.
//! - [`loader`] keeps track of which files exist and which to read next.

pub mod config;
pub mod loader;
pub mod process;
pub mod tracker;

pub use loader::{Loader, ReadSelection, TimeRange};
pub use process::{read_nem_csv, NemTable};
