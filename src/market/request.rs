//! Historical candle requests.

use chrono::{DateTime, Utc};

/// Candles wanted from a source: one symbol, one sampling interval, and the
/// inclusive open-time range `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlineRequest {
    pub symbol: String,
    /// Provider interval label, e.g. `"1m"`
    pub interval: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl KlineRequest {
    pub fn new(
        symbol: impl Into<String>,
        interval: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            start,
            end,
        }
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}
