//! Run configuration: TOML file defaults, overridden by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::error::{CatalogError, ConfigError};
use crate::fingerprint::catalog::CatalogBuilder;
use crate::fingerprint::window::{CANONICAL_WINDOWS, parse_span};

/// Settings for fetch, archive and catalog output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Exchange symbol to fetch
    pub symbol: String,
    /// Candle sampling interval, in the provider's notation
    pub interval: String,
    /// How far back to fetch when no start date is given
    pub period: String,
    /// Earliest candle to fetch, ISO-8601
    pub start_date: Option<String>,
    /// Catalog destination
    pub output: PathBuf,
    /// Raw candle archive
    pub store_path: PathBuf,
    /// Window labels, in catalog order
    pub windows: Vec<String>,
    /// Sweep windows on a thread pool
    pub parallel: bool,
    /// Provider WebSocket URL override
    pub endpoint: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval: "1m".to_string(),
            period: "7d".to_string(),
            start_date: None,
            output: PathBuf::from("output/fingerprints.json"),
            store_path: PathBuf::from("data/candles.csv"),
            windows: CANONICAL_WINDOWS.iter().map(|w| w.to_string()).collect(),
            parallel: true,
            endpoint: None,
        }
    }
}

impl AppConfig {
    /// Loads `path` if given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let display = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Toml {
            path: display,
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Builds the catalog builder for the configured windows. Fails on a bad
    /// window set before anything is fetched.
    pub fn catalog_builder(&self) -> Result<CatalogBuilder, CatalogError> {
        Ok(CatalogBuilder::from_labels(&self.windows)?.parallel(self.parallel))
    }

    pub fn period(&self) -> Result<Duration, ConfigError> {
        parse_period(&self.period)
    }

    /// The first instant to fetch: the explicit start date, or `now - period`.
    pub fn resolve_start(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ConfigError> {
        match &self.start_date {
            Some(value) => parse_instant(value),
            None => now
                .checked_sub_signed(self.period()?)
                .ok_or_else(|| ConfigError::Period(self.period.clone())),
        }
    }
}

pub fn parse_period(period: &str) -> Result<Duration, ConfigError> {
    parse_span(period).ok_or_else(|| ConfigError::Period(period.to_string()))
}

/// Parses RFC 3339, or a naive datetime/date taken as UTC.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, ConfigError> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ConfigError::Instant(value.to_string()))
}
