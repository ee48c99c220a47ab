//! Candle source and raw archive collaborators.
//! The fingerprint core never depends on anything in here.

pub mod kline_protocol;
pub mod providers;
pub mod request;
pub mod source;
pub mod store;
pub mod websocket_client;

// Re-exports for convenience
pub use kline_protocol::{KlinePage, KlineProtocol};
pub use request::KlineRequest;
pub use source::{CandleSource, CsvCandleSource};
pub use store::{CsvCandleStore, RawCandleStore};
pub use websocket_client::KlineClient;

// Re-export provider convenience functions
pub use providers::binance::new_binance_client;
