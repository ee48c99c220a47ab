//! Match the most recent market state against a stored catalog.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::artifact::ArtifactEmitter;
use crate::config::{AppConfig, parse_instant};
use crate::error::{CatalogError, PipelineError};
use crate::fingerprint::catalog::FingerprintCatalog;
use crate::fingerprint::fingerprinter::{Fingerprint, fingerprint_window};
use crate::fingerprint::series::CandleSeries;
use crate::fingerprint::window::WindowSpec;
use crate::market::request::KlineRequest;
use crate::market::source::CandleSource;
use crate::market::store::RawCandleStore;
use crate::pipeline::ingest;

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// The catalog already held this fingerprint
    Matched(Fingerprint),
    /// The fingerprint was new and has been appended
    Added(Fingerprint),
}

impl MatchOutcome {
    pub fn fingerprint(&self) -> &Fingerprint {
        match self {
            MatchOutcome::Matched(fp) | MatchOutcome::Added(fp) => fp,
        }
    }
}

/// Fingerprint anchored at the last candle of `series`.
pub fn latest_fingerprint(series: &CandleSeries, window: &WindowSpec) -> Option<Fingerprint> {
    fingerprint_window(series, window).pop()
}

/// Looks `latest` up by id. Returns the catalog to persist when it was new.
pub fn match_or_append(
    catalog: FingerprintCatalog,
    latest: Fingerprint,
) -> (Option<FingerprintCatalog>, MatchOutcome) {
    if let Some(existing) = catalog.find_by_id(&latest.fingerprint_id) {
        let outcome = MatchOutcome::Matched(existing.clone());
        return (None, outcome);
    }
    let grown = catalog.with_appended(latest.clone());
    (Some(grown), MatchOutcome::Added(latest))
}

/// The fetch range for matching `window`.
///
/// Ends at the source's newest candle when it has one (an archive), else at
/// `now`. Starts at the configured start date, or one window before the end.
pub async fn match_request<S: CandleSource>(
    source: &S,
    config: &AppConfig,
    window: &WindowSpec,
    now: DateTime<Utc>,
) -> Result<KlineRequest, PipelineError> {
    let end = source.latest_available().await?.unwrap_or(now);
    let start = match &config.start_date {
        Some(value) => parse_instant(value)?,
        None => end.checked_sub_signed(window.duration()).ok_or_else(|| {
            CatalogError::WindowConfiguration(format!(
                "window '{window}' reaches before the earliest representable instant"
            ))
        })?,
    };
    debug!(source = source.name(), %start, %end, "match range resolved");
    Ok(KlineRequest::new(&config.symbol, &config.interval, start, end))
}

/// Fetches the trailing `window`, fingerprints it, and matches the newest
/// fingerprint against `catalog`. New fingerprints are appended and emitted.
pub async fn run_match<S, T, E>(
    source: &S,
    store: &mut T,
    emitter: &E,
    catalog: FingerprintCatalog,
    window: &WindowSpec,
    request: &KlineRequest,
) -> Result<MatchOutcome, PipelineError>
where
    S: CandleSource,
    T: RawCandleStore,
    E: ArtifactEmitter,
{
    let series = ingest(source, store, request).await?;
    let latest = latest_fingerprint(&series, window)
        .ok_or_else(|| PipelineError::NotEnoughCandles(window.name().to_string()))?;

    let (updated, outcome) = match_or_append(catalog, latest);
    if let Some(updated) = updated {
        emitter.emit(&updated)?;
    }

    match &outcome {
        MatchOutcome::Matched(fp) => {
            info!(
                window = %window,
                fingerprint_id = %fp.fingerprint_id,
                "fingerprint already catalogued"
            )
        }
        MatchOutcome::Added(fp) => {
            info!(window = %window, fingerprint_id = %fp.fingerprint_id, "new fingerprint appended")
        }
    }
    Ok(outcome)
}
