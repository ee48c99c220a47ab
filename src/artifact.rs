//! Catalog persistence: JSON on disk.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::EmitError;
use crate::fingerprint::catalog::FingerprintCatalog;

/// Hands a finished catalog to a durable sink.
pub trait ArtifactEmitter {
    fn emit(&self, catalog: &FingerprintCatalog) -> Result<(), EmitError>;
}

/// Writes `{"fingerprints": [...], "price_changes": [...]}` as pretty JSON.
///
/// Output for a given catalog is byte-stable. The file is written beside its
/// destination and renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileEmitter {
    path: PathBuf,
}

impl JsonFileEmitter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArtifactEmitter for JsonFileEmitter {
    fn emit(&self, catalog: &FingerprintCatalog) -> Result<(), EmitError> {
        let path = self.path.display().to_string();
        let io_err = |source: std::io::Error| EmitError::Io {
            path: path.clone(),
            source,
        };

        let bytes = serde_json::to_vec_pretty(catalog).map_err(|source| EmitError::Json {
            path: path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, &bytes).map_err(io_err)?;
        fs::rename(&staging, &self.path).map_err(io_err)?;

        info!(
            path = %path,
            fingerprints = catalog.fingerprints().len(),
            bytes = bytes.len(),
            "catalog written"
        );
        Ok(())
    }
}

/// Reads a catalog written by [`JsonFileEmitter`]. A missing file is an
/// empty catalog; missing top-level keys default to empty lists.
pub fn load_catalog(path: &Path) -> Result<FingerprintCatalog, EmitError> {
    if !path.exists() {
        debug!(path = %path.display(), "no catalog on disk, starting empty");
        return Ok(FingerprintCatalog::default());
    }

    let display = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| EmitError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| EmitError::Json {
        path: display,
        source,
    })
}

/// Renders the first `rows` fingerprints as a fixed-width table.
pub fn preview(catalog: &FingerprintCatalog, rows: usize) -> String {
    let mut out = String::from("Fingerprint preview:\n");
    let _ = writeln!(
        out,
        "{:<6} {:<25} {:<25} {:>14} {:>14} {:>12} {:>9} {:>12} {:>6}",
        "window", "start", "end", "open", "close", "net_change", "pct", "volatility", "count"
    );
    for fp in catalog.fingerprints().iter().take(rows) {
        let _ = writeln!(
            out,
            "{:<6} {:<25} {:<25} {:>14.4} {:>14.4} {:>12.4} {:>9.4} {:>12.4} {:>6}",
            fp.window,
            fp.start_timestamp.to_rfc3339(),
            fp.end_timestamp.to_rfc3339(),
            fp.open,
            fp.close,
            fp.net_change,
            fp.pct_change,
            fp.volatility,
            fp.candle_count
        );
    }
    out
}
