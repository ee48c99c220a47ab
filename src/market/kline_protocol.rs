//! KlineProtocol trait for exchange-specific historical kline requests.

use chrono::{DateTime, Utc};

use crate::error::SourceError;
use crate::fingerprint::candle::Candle;
use crate::market::request::KlineRequest;

// KlineClient owns the socket and the paging loop; a protocol only knows how
// to phrase one page request and how to read one response.

/// One page of candles answering request `id`.
#[derive(Debug, Clone)]
pub struct KlinePage {
    pub id: u64,
    pub candles: Vec<Candle>,
}

/// Trait for exchange-specific kline request formatting and response parsing.
pub trait KlineProtocol: Send + Sync + 'static {
    /// Returns the primary WebSocket API endpoint URL.
    fn endpoint(&self) -> &str;

    /// Returns a fallback endpoint URL (if primary fails).
    fn fallback_endpoint(&self) -> Option<&str> {
        None
    }

    fn name(&self) -> &'static str;

    /// Maximum candles the exchange returns per page.
    fn page_limit(&self) -> usize;

    /// Formats a request for up to `page_limit` candles opening at or after `from`.
    fn format_request(&self, id: u64, request: &KlineRequest, from: DateTime<Utc>) -> String;

    /// Parses a text frame.
    ///
    /// Returns `Ok(Some(page))` for a kline response, `Ok(None)` for frames that
    /// are not responses (the caller keeps reading), and `Err` when the
    /// exchange reported an error or the payload is malformed.
    fn parse_response(&self, msg: &str) -> Result<Option<KlinePage>, SourceError>;
}
