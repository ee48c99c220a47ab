//! Exchange provider implementations.

pub mod binance;

// Re-export for convenience
pub use binance::{BinanceClient, BinanceKlines, new_binance_client};
