//! Trailing window durations used to slice a candle series.

use chrono::Duration;

use crate::error::CatalogError;

/// The canonical window set, finest to coarsest. Catalogs built with the
/// default configuration list fingerprints in exactly this order.
pub const CANONICAL_WINDOWS: [&str; 9] = ["1m", "5m", "10m", "30m", "1h", "6h", "12h", "24h", "7d"];

/// A named, fixed trailing duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    name: String,
    duration: Duration,
}

impl WindowSpec {
    /// Rejects durations that are zero or negative.
    pub fn new(name: impl Into<String>, duration: Duration) -> Result<Self, CatalogError> {
        let name = name.into();
        if duration <= Duration::zero() {
            return Err(CatalogError::WindowConfiguration(format!(
                "window '{name}' must have a positive duration, got {duration}"
            )));
        }
        Ok(Self { name, duration })
    }

    /// Parses a label such as `"5m"`, `"12h"` or `"7d"`; the label becomes the name.
    pub fn parse(label: &str) -> Result<Self, CatalogError> {
        let duration = parse_span(label).ok_or_else(|| {
            CatalogError::WindowConfiguration(format!("unrecognised window label '{label}'"))
        })?;
        Self::new(label, duration)
    }

    /// All nine canonical windows in configured order.
    pub fn canonical() -> Vec<WindowSpec> {
        CANONICAL_WINDOWS
            .iter()
            .filter_map(|label| Self::parse(label).ok())
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn duration_secs(&self) -> i64 {
        self.duration.num_seconds()
    }
}

impl std::fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Parses `<count><unit>` where unit is one of `m`, `h`, `d`, `w`, `y`
/// (minutes, hours, days, weeks, 365-day years). A bare count means days.
///
/// Returns `None` for anything else, including counts that overflow.
pub fn parse_span(text: &str) -> Option<Duration> {
    let text = text.trim();
    let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let (count, unit) = text.split_at(digits);
    let count: i64 = count.parse().ok()?;

    match unit {
        "m" => Duration::try_minutes(count),
        "h" => Duration::try_hours(count),
        "" | "d" => Duration::try_days(count),
        "w" => Duration::try_weeks(count),
        "y" => Duration::try_days(count.checked_mul(365)?),
        _ => None,
    }
}
