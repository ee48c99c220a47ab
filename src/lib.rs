//! Price fingerprints: fixed-shape summaries of price movement over trailing
//! windows, anchored at every candle of a series.
//!
//! [`fingerprint`] is the pure core. [`market`], [`artifact`] and the
//! [`pipeline`] around them fetch candles, archive them and persist catalogs.

pub mod artifact;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod market;
pub mod matching;
pub mod pipeline;

pub use error::{CatalogError, ConfigError, EmitError, PipelineError, SourceError, StoreError};
pub use fingerprint::{
    Candle, CandleSeries, CatalogBuilder, Fingerprint, FingerprintCatalog, PriceChange, WindowSpec,
};
