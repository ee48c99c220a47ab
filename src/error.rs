//! Error types for fingerprinting and its collaborators.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failures of the fingerprint core. Raised before any fingerprint is computed.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Series not strictly ascending by timestamp (includes duplicates)
    #[error(
        "candle {index} at {current} does not come after previous candle at {previous}"
    )]
    InputOrdering {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    /// Candle values that cannot be summarised
    #[error("invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: String },

    /// Rejected window set (non-positive duration, duplicates, bad labels)
    #[error("window configuration error: {0}")]
    WindowConfiguration(String),
}

/// Candle source failures.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("connection failed: {0}")]
    Connection(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("connection closed before response {request_id} arrived")]
    ConnectionClosed { request_id: u64 },

    #[error("malformed response: {0}")]
    Protocol(String),

    #[error("provider rejected request ({code}): {msg}")]
    Api { code: i64, msg: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Raw-row archive failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Artifact emit/load failures.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse fingerprint catalog at {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("unable to parse period '{0}', expected formats like '7d', '24h', or '60m'")]
    Period(String),

    #[error("unable to parse instant '{0}', expected ISO-8601")]
    Instant(String),
}

/// Anything a fetch → archive → build → emit run can fail with.
/// Collaborator errors pass through untouched.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("not enough candles to fingerprint window '{0}'")]
    NotEnoughCandles(String),
}
