//! Fingerprint catalog assembly.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CatalogError;
use crate::fingerprint::candle::Candle;
use crate::fingerprint::change_index::{PriceChange, change_index};
use crate::fingerprint::fingerprinter::{Fingerprint, fingerprint_window};
use crate::fingerprint::series::CandleSeries;
use crate::fingerprint::window::WindowSpec;

/// Fingerprints for every configured window plus the change index.
///
/// Fingerprints are ordered by window (in configured order), then by anchor
/// timestamp ascending. Serialises as `{fingerprints: [...], price_changes: [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FingerprintCatalog {
    #[serde(default)]
    fingerprints: Vec<Fingerprint>,
    #[serde(default)]
    price_changes: Vec<PriceChange>,
}

impl FingerprintCatalog {
    pub fn new(fingerprints: Vec<Fingerprint>, price_changes: Vec<PriceChange>) -> Self {
        Self {
            fingerprints,
            price_changes,
        }
    }

    pub fn fingerprints(&self) -> &[Fingerprint] {
        &self.fingerprints
    }

    pub fn price_changes(&self) -> &[PriceChange] {
        &self.price_changes
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty() && self.price_changes.is_empty()
    }

    /// Fingerprints of a single window, in anchor order.
    pub fn for_window<'a>(&'a self, window: &'a str) -> impl Iterator<Item = &'a Fingerprint> + 'a {
        self.fingerprints.iter().filter(move |fp| fp.window == window)
    }

    pub fn find_by_id(&self, fingerprint_id: &str) -> Option<&Fingerprint> {
        self.fingerprints
            .iter()
            .find(|fp| fp.fingerprint_id == fingerprint_id)
    }

    /// Returns a new catalog with `fingerprint` added at the end.
    pub fn with_appended(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprints.push(fingerprint);
        self
    }
}

/// Runs the change indexer and one window sweep per configured window.
///
/// The window set is fixed at construction and validated there, so `build`
/// itself cannot fail once it has a valid series.
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    windows: Vec<WindowSpec>,
    parallel: bool,
}

impl CatalogBuilder {
    /// Rejects an empty window set and duplicate window names.
    pub fn new(windows: Vec<WindowSpec>) -> Result<Self, CatalogError> {
        if windows.is_empty() {
            return Err(CatalogError::WindowConfiguration(
                "at least one window is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for window in &windows {
            if !seen.insert(window.name()) {
                return Err(CatalogError::WindowConfiguration(format!(
                    "window '{}' configured more than once",
                    window.name()
                )));
            }
        }
        Ok(Self {
            windows,
            parallel: true,
        })
    }

    /// The nine canonical windows.
    pub fn canonical() -> Self {
        Self {
            windows: WindowSpec::canonical(),
            parallel: true,
        }
    }

    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self, CatalogError> {
        let windows = labels
            .iter()
            .map(|label| WindowSpec::parse(label.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(windows)
    }

    /// Sweep windows on the rayon pool (default) or one after another.
    /// Output is identical either way.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn windows(&self) -> &[WindowSpec] {
        &self.windows
    }

    pub fn build(&self, series: &CandleSeries) -> FingerprintCatalog {
        let price_changes = change_index(series);

        // Collect keeps configured order regardless of which sweep finishes first.
        let per_window: Vec<Vec<Fingerprint>> = if self.parallel {
            self.windows
                .par_iter()
                .map(|window| fingerprint_window(series, window))
                .collect()
        } else {
            self.windows
                .iter()
                .map(|window| fingerprint_window(series, window))
                .collect()
        };

        let total = per_window.iter().map(Vec::len).sum();
        let mut fingerprints = Vec::with_capacity(total);
        for window_fingerprints in per_window {
            fingerprints.extend(window_fingerprints);
        }

        info!(
            candles = series.len(),
            windows = self.windows.len(),
            fingerprints = fingerprints.len(),
            price_changes = price_changes.len(),
            "catalog built"
        );
        FingerprintCatalog::new(fingerprints, price_changes)
    }

    /// Validates raw candles into a series, then builds. Ordering problems
    /// surface here before any fingerprint is computed.
    pub fn build_from_candles(
        &self,
        candles: Vec<Candle>,
    ) -> Result<FingerprintCatalog, CatalogError> {
        let series = CandleSeries::new(candles)?;
        debug!(candles = series.len(), "series validated");
        Ok(self.build(&series))
    }
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::canonical()
    }
}
