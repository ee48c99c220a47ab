//! Per-window fingerprint sweep.
//!
//! Every candle is an anchor. The window for an anchor at `t` covers
//! `[t - D, t]`, inclusive at both ends. Because timestamps only move forward,
//! the left edge of that range only moves forward too, so one pass with two
//! indices visits each candle at most twice per window duration.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::fingerprint::candle::Candle;
use crate::fingerprint::rolling::{Extreme, Moments, RollingExtreme, RollingMoments};
use crate::fingerprint::series::CandleSeries;
use crate::fingerprint::window::WindowSpec;

/// Summary of price action inside one window ending at one anchor.
///
/// Identified by `(window, anchor_timestamp)`. `end_timestamp` always equals
/// `anchor_timestamp`; `start_timestamp` is the earliest candle in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub window: String,
    pub duration_secs: i64,
    pub anchor_timestamp: DateTime<Utc>,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: DateTime<Utc>,
    /// Close of the earliest candle in the window
    pub open: f64,
    /// Close of the anchor candle
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub net_change: f64,
    pub pct_change: f64,
    /// Population standard deviation of closes
    pub volatility: f64,
    pub average_volume: f64,
    pub candle_count: usize,
    pub fingerprint_id: String,
}

impl Fingerprint {
    fn summarise(
        window: &WindowSpec,
        start: &Candle,
        anchor: &Candle,
        candle_count: usize,
        high: f64,
        low: f64,
        moments: Moments,
    ) -> Self {
        let open = start.get_close();
        let close = anchor.get_close();
        let net_change = close - open;
        let pct_change = if open != 0.0 { net_change / open * 100.0 } else { 0.0 };
        let fingerprint_id = fingerprint_id(
            window.name(),
            start.get_timestamp(),
            anchor.get_timestamp(),
            [open, close, high, low],
            candle_count,
        );

        Self {
            window: window.name().to_string(),
            duration_secs: window.duration_secs(),
            anchor_timestamp: anchor.get_timestamp(),
            start_timestamp: start.get_timestamp(),
            end_timestamp: anchor.get_timestamp(),
            open,
            close,
            high,
            low,
            net_change,
            pct_change,
            volatility: moments.close_std(),
            average_volume: moments.average_volume(),
            candle_count,
            fingerprint_id,
        }
    }
}

/// Computes one fingerprint per candle of `series` for a single window.
///
/// Output is in anchor order. An empty series yields an empty list.
pub fn fingerprint_window(series: &CandleSeries, window: &WindowSpec) -> Vec<Fingerprint> {
    let candles = series.candles();
    if candles.is_empty() {
        return Vec::new();
    }

    let mut highs = RollingExtreme::new(Extreme::Max);
    let mut lows = RollingExtreme::new(Extreme::Min);
    let mut moments = RollingMoments::new();
    let mut fingerprints = Vec::with_capacity(candles.len());
    let mut left = 0;

    for (right, anchor) in candles.iter().enumerate() {
        highs.push(right, anchor.get_high());
        lows.push(right, anchor.get_low());
        moments.push(anchor.get_close(), anchor.get_volume());

        // None only when the bound underflows chrono's range; nothing is older then.
        if let Some(lower) = anchor.get_timestamp().checked_sub_signed(window.duration()) {
            while candles[left].get_timestamp() < lower {
                moments.pop_front();
                left += 1;
            }
        }
        highs.evict_before(left);
        lows.evict_before(left);

        fingerprints.push(Fingerprint::summarise(
            window,
            &candles[left],
            anchor,
            right - left + 1,
            highs.current().unwrap_or(anchor.get_high()),
            lows.current().unwrap_or(anchor.get_low()),
            moments.total(),
        ));
    }

    debug!(
        window = window.name(),
        fingerprints = fingerprints.len(),
        "window sweep complete"
    );
    fingerprints
}

fn fingerprint_id(
    window: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    prices: [f64; 4],
    candle_count: usize,
) -> String {
    let mut hasher = Sha256::new();
    let mut feed = |part: &str| {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    };
    feed(window);
    feed(&start.to_rfc3339_opts(SecondsFormat::AutoSi, true));
    feed(&end.to_rfc3339_opts(SecondsFormat::AutoSi, true));
    for price in prices {
        feed(&price.to_string());
    }
    feed(&candle_count.to_string());
    hex::encode(hasher.finalize())
}
