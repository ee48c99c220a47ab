//! Fingerprint core: candle series in, catalog out. Pure and synchronous.

pub mod candle;
pub mod catalog;
pub mod change_index;
pub mod fingerprinter;
pub mod rolling;
pub mod series;
pub mod window;

// Re-exports for convenience
pub use candle::Candle;
pub use catalog::{CatalogBuilder, FingerprintCatalog};
pub use change_index::{PriceChange, change_index};
pub use fingerprinter::{Fingerprint, fingerprint_window};
pub use series::CandleSeries;
pub use window::{CANONICAL_WINDOWS, WindowSpec};
