//! Candle (OHLCV) data structure with timestamp

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a single candlestick with OHLCV data and timestamp.
///
/// The timestamp is the candle open time in UTC. Candles are immutable once
/// built; a [`CandleSeries`](super::series::CandleSeries) checks ordering and
/// value sanity when it takes ownership of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Creates a candle from a Unix timestamp in milliseconds, the format
    /// most exchanges use for kline open times.
    ///
    /// Returns `None` if the timestamp is out of chrono's range.
    pub fn from_millis(
        timestamp_ms: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Option<Self> {
        let timestamp = DateTime::from_timestamp_millis(timestamp_ms)?;
        Some(Self::new(timestamp, open, high, low, close, volume))
    }

    pub fn get_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn get_open(&self) -> f64 {
        self.open
    }

    pub fn get_high(&self) -> f64 {
        self.high
    }

    pub fn get_low(&self) -> f64 {
        self.low
    }

    pub fn get_close(&self) -> f64 {
        self.close
    }

    pub fn get_volume(&self) -> f64 {
        self.volume
    }

    /// Checks the values a fingerprint relies on.
    ///
    /// Prices and volume must be finite, volume non-negative, and the
    /// open/close must sit inside `[low, high]`.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(format!("{name} is not finite ({value})"));
            }
        }
        if self.volume < 0.0 {
            return Err(format!("volume is negative ({})", self.volume));
        }
        if self.low > self.high {
            return Err(format!("low {} above high {}", self.low, self.high));
        }
        if self.open < self.low || self.open > self.high {
            return Err(format!("open {} outside [{}, {}]", self.open, self.low, self.high));
        }
        if self.close < self.low || self.close > self.high {
            return Err(format!("close {} outside [{}, {}]", self.close, self.low, self.high));
        }
        Ok(())
    }
}
