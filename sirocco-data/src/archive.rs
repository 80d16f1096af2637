//! Columnar bar archive layout.
//!
//! The persisted bar archive is partitioned by frequency and year:
//!
//! ```text
//! <root>/kline/frequency=<freq>/year=<YYYY>/data.parquet
//! ```
//!
//! Each row carries symbol, timestamp, frequency tag, OHLC, volume,
//! amount, and any precomputed indicator columns. Reading the files is an
//! upstream concern; the core only agrees on the layout.

use std::path::{Path, PathBuf};

use sirocco_core::data::Frequency;

/// Returns the partition path for one frequency/year under `root`.
#[must_use]
pub fn kline_partition_path(root: &Path, frequency: Frequency, year: i32) -> PathBuf {
    root.join("kline")
        .join(format!("frequency={}", frequency.as_str()))
        .join(format!("year={year}"))
        .join("data.parquet")
}
