//! Raw candle archive.
//!
//! A one-way sink: the pipeline hands it every series it ingests and never
//! reads back through it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::StoreError;
use crate::fingerprint::series::CandleSeries;
use crate::market::source::read_csv_rows;

pub trait RawCandleStore {
    /// Archives every candle of `series`. Returns the number of rows now held.
    fn archive(&mut self, series: &CandleSeries) -> Result<usize, StoreError>;
}

/// CSV file keyed by candle timestamp. Re-archiving a timestamp replaces the
/// stored row, so overlapping fetches merge instead of duplicating.
#[derive(Debug, Clone)]
pub struct CsvCandleStore {
    path: PathBuf,
}

impl CsvCandleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RawCandleStore for CsvCandleStore {
    fn archive(&mut self, series: &CandleSeries) -> Result<usize, StoreError> {
        if series.is_empty() {
            debug!("nothing to archive");
            return Ok(0);
        }

        let mut rows = BTreeMap::new();
        if self.path.exists() {
            for candle in read_csv_rows(&self.path)? {
                rows.insert(candle.get_timestamp(), candle);
            }
        }
        let previous = rows.len();
        for candle in series.candles() {
            rows.insert(candle.get_timestamp(), *candle);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&staging)?;
            for candle in rows.values() {
                writer.serialize(candle)?;
            }
            writer.flush()?;
        }
        fs::rename(&staging, &self.path)?;

        info!(
            path = %self.path.display(),
            added = rows.len() - previous,
            total = rows.len(),
            "candles archived"
        );
        Ok(rows.len())
    }
}
