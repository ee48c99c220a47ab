//! Consecutive-candle close deltas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::series::CandleSeries;

/// Close-to-close move between a candle and the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    /// Timestamp of the later candle in the pair
    pub timestamp: DateTime<Utc>,
    pub delta: f64,
}

/// Builds the change index: one entry per adjacent pair, in series order.
/// A series shorter than two candles has no changes.
pub fn change_index(series: &CandleSeries) -> Vec<PriceChange> {
    series
        .candles()
        .windows(2)
        .map(|pair| PriceChange {
            timestamp: pair[1].get_timestamp(),
            delta: pair[1].get_close() - pair[0].get_close(),
        })
        .collect()
}
