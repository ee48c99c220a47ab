//! Candle sources: anything that can answer a [`KlineRequest`].

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::SourceError;
use crate::fingerprint::candle::Candle;
use crate::market::request::KlineRequest;

/// Supplies candles for a requested range, sorted ascending by timestamp
/// with no duplicates. Callers still validate that contract.
pub trait CandleSource {
    fn name(&self) -> &str;

    fn fetch(
        &self,
        request: &KlineRequest,
    ) -> impl Future<Output = Result<Vec<Candle>, SourceError>> + Send;

    /// Open time of the newest candle this source can serve, for bounded
    /// sources such as an archive. Live sources return `None`: they serve up
    /// to the present.
    fn latest_available(
        &self,
    ) -> impl Future<Output = Result<Option<DateTime<Utc>>, SourceError>> + Send {
        async { Ok(None) }
    }
}

/// Reads candles from a CSV archive written by
/// [`CsvCandleStore`](crate::market::store::CsvCandleStore).
///
/// Rows are returned in file order; only rows inside the request range are kept.
#[derive(Debug, Clone)]
pub struct CsvCandleSource {
    path: PathBuf,
}

impl CsvCandleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CandleSource for CsvCandleSource {
    fn name(&self) -> &str {
        "csv"
    }

    async fn fetch(&self, request: &KlineRequest) -> Result<Vec<Candle>, SourceError> {
        let path = self.path.clone();
        let request = request.clone();
        info!(path = %path.display(), "reading candles from CSV");

        let candles = tokio::task::spawn_blocking(move || read_candles(&path, &request))
            .await
            .map_err(std::io::Error::other)??;

        debug!(candles = candles.len(), "CSV candles loaded");
        Ok(candles)
    }

    async fn latest_available(&self) -> Result<Option<DateTime<Utc>>, SourceError> {
        let path = self.path.clone();
        let rows = tokio::task::spawn_blocking(move || read_csv_rows(&path))
            .await
            .map_err(std::io::Error::other)??;
        Ok(rows.iter().map(Candle::get_timestamp).max())
    }
}

pub(crate) fn read_csv_rows(path: &Path) -> Result<Vec<Candle>, csv::Error> {
    let mut reader = csv::Reader::from_path(path)?;
    reader.deserialize().collect()
}

fn read_candles(path: &Path, request: &KlineRequest) -> Result<Vec<Candle>, SourceError> {
    Ok(read_csv_rows(path)?
        .into_iter()
        .filter(|candle| request.contains(candle.get_timestamp()))
        .collect())
}
