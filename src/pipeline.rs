//! Fetch → archive → fingerprint → emit.
//!
//! The only place the pure core meets its collaborators. Collaborator errors
//! are returned as-is; nothing is emitted unless every earlier step succeeded.

use tracing::{info, warn};

use crate::artifact::ArtifactEmitter;
use crate::error::PipelineError;
use crate::fingerprint::catalog::{CatalogBuilder, FingerprintCatalog};
use crate::fingerprint::series::CandleSeries;
use crate::market::request::KlineRequest;
use crate::market::source::CandleSource;
use crate::market::store::RawCandleStore;

/// Fetches `request`, archives the raw candles, builds the catalog and emits it.
pub async fn run_build<S, T, E>(
    source: &S,
    store: &mut T,
    emitter: &E,
    builder: &CatalogBuilder,
    request: &KlineRequest,
) -> Result<FingerprintCatalog, PipelineError>
where
    S: CandleSource,
    T: RawCandleStore,
    E: ArtifactEmitter,
{
    let series = ingest(source, store, request).await?;
    if series.is_empty() {
        warn!(
            source = source.name(),
            symbol = %request.symbol,
            "no candles in requested range, emitting an empty catalog"
        );
    }

    let catalog = builder.build(&series);
    emitter.emit(&catalog)?;
    Ok(catalog)
}

/// Fetches and validates a series, then hands it to the archive once.
pub async fn ingest<S, T>(
    source: &S,
    store: &mut T,
    request: &KlineRequest,
) -> Result<CandleSeries, PipelineError>
where
    S: CandleSource,
    T: RawCandleStore,
{
    info!(
        source = source.name(),
        symbol = %request.symbol,
        interval = %request.interval,
        start = %request.start,
        end = %request.end,
        "fetching candles"
    );
    let candles = source.fetch(request).await?;
    let series = CandleSeries::new(candles)?;
    store.archive(&series)?;
    Ok(series)
}
