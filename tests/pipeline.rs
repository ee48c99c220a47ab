use std::cell::Cell;
use std::fs;

use chrono::{DateTime, Utc};
use price_fingerprints::artifact::{ArtifactEmitter, JsonFileEmitter, load_catalog};
use price_fingerprints::fingerprint::{
    Candle, CandleSeries, CatalogBuilder, FingerprintCatalog, WindowSpec,
};
use price_fingerprints::market::{
    CandleSource, CsvCandleSource, CsvCandleStore, KlineRequest, RawCandleStore,
};
use price_fingerprints::config::AppConfig;
use price_fingerprints::matching::{MatchOutcome, match_request, run_match};
use price_fingerprints::pipeline::run_build;
use price_fingerprints::{CatalogError, EmitError, PipelineError, SourceError, StoreError};

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn flat(secs: i64, close: f64) -> Candle {
    Candle::from_millis(secs * 1000, close, close, close, close, 2.0).unwrap()
}

fn request() -> KlineRequest {
    KlineRequest::new("BTCUSDT", "1m", at(0), at(10_000))
}

struct FixedSource(Vec<Candle>);

impl CandleSource for FixedSource {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn fetch(&self, _request: &KlineRequest) -> Result<Vec<Candle>, SourceError> {
        Ok(self.0.clone())
    }
}

struct FailingSource;

impl CandleSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch(&self, _request: &KlineRequest) -> Result<Vec<Candle>, SourceError> {
        Err(SourceError::Api {
            code: -1121,
            msg: "Invalid symbol.".to_string(),
        })
    }
}

#[derive(Default)]
struct MemoryStore {
    calls: usize,
    rows: usize,
}

impl RawCandleStore for MemoryStore {
    fn archive(&mut self, series: &CandleSeries) -> Result<usize, StoreError> {
        self.calls += 1;
        self.rows += series.len();
        Ok(self.rows)
    }
}

struct BrokenStore;

impl RawCandleStore for BrokenStore {
    fn archive(&mut self, _series: &CandleSeries) -> Result<usize, StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk full")))
    }
}

#[derive(Default)]
struct CountingEmitter {
    emitted: Cell<usize>,
}

impl ArtifactEmitter for CountingEmitter {
    fn emit(&self, _catalog: &FingerprintCatalog) -> Result<(), EmitError> {
        self.emitted.set(self.emitted.get() + 1);
        Ok(())
    }
}

#[tokio::test]
async fn test_build_archives_once_and_emits_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("fingerprints.json");
    let source = FixedSource(vec![flat(0, 100.0), flat(60, 105.0), flat(120, 95.0)]);
    let mut store = MemoryStore::default();
    let emitter = JsonFileEmitter::new(&output);

    let catalog = run_build(&source, &mut store, &emitter, &CatalogBuilder::canonical(), &request())
        .await
        .unwrap();

    assert_eq!(store.calls, 1);
    assert_eq!(store.rows, 3);
    assert_eq!(catalog.fingerprints().len(), 27);
    assert_eq!(load_catalog(&output).unwrap(), catalog);
}

#[tokio::test]
async fn test_build_twice_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let candles: Vec<Candle> = (0..200)
        .map(|i| flat(i * 60, 100.0 + (i % 7) as f64 * 0.1))
        .collect();
    let mut outputs = Vec::new();

    for name in ["a.json", "b.json"] {
        let output = dir.path().join(name);
        run_build(
            &FixedSource(candles.clone()),
            &mut MemoryStore::default(),
            &JsonFileEmitter::new(&output),
            &CatalogBuilder::canonical(),
            &request(),
        )
        .await
        .unwrap();
        outputs.push(fs::read(&output).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[tokio::test]
async fn test_empty_fetch_emits_empty_catalog() {
    let emitter = CountingEmitter::default();
    let catalog = run_build(
        &FixedSource(Vec::new()),
        &mut MemoryStore::default(),
        &emitter,
        &CatalogBuilder::canonical(),
        &request(),
    )
    .await
    .unwrap();

    assert!(catalog.is_empty());
    assert_eq!(emitter.emitted.get(), 1);
}

#[tokio::test]
async fn test_unsorted_fetch_fails_before_archive_or_emit() {
    let mut store = MemoryStore::default();
    let emitter = CountingEmitter::default();
    let err = run_build(
        &FixedSource(vec![flat(60, 1.0), flat(0, 2.0)]),
        &mut store,
        &emitter,
        &CatalogBuilder::canonical(),
        &request(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::Catalog(CatalogError::InputOrdering { .. })));
    assert_eq!(store.calls, 0);
    assert_eq!(emitter.emitted.get(), 0);
}

#[tokio::test]
async fn test_source_error_passes_through() {
    let emitter = CountingEmitter::default();
    let err = run_build(
        &FailingSource,
        &mut MemoryStore::default(),
        &emitter,
        &CatalogBuilder::canonical(),
        &request(),
    )
    .await
    .unwrap_err();

    match err {
        PipelineError::Source(SourceError::Api { code, .. }) => assert_eq!(code, -1121),
        other => panic!("Expected source error, got {other:?}"),
    }
    assert_eq!(emitter.emitted.get(), 0);
}

#[tokio::test]
async fn test_store_error_stops_emit() {
    let emitter = CountingEmitter::default();
    let err = run_build(
        &FixedSource(vec![flat(0, 1.0)]),
        &mut BrokenStore,
        &emitter,
        &CatalogBuilder::canonical(),
        &request(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::Store(StoreError::Io(_))));
    assert_eq!(emitter.emitted.get(), 0);
}

#[tokio::test]
async fn test_csv_archive_feeds_offline_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("data").join("candles.csv");
    let candles = vec![flat(0, 100.0), flat(60, 105.0), flat(120, 95.0)];

    let mut store = CsvCandleStore::new(&archive);
    let first = run_build(
        &FixedSource(candles),
        &mut store,
        &CountingEmitter::default(),
        &CatalogBuilder::canonical(),
        &request(),
    )
    .await
    .unwrap();

    let rebuilt = run_build(
        &CsvCandleSource::new(&archive),
        &mut MemoryStore::default(),
        &CountingEmitter::default(),
        &CatalogBuilder::canonical(),
        &request(),
    )
    .await
    .unwrap();

    assert_eq!(first, rebuilt);
}

#[tokio::test]
async fn test_match_appends_then_matches() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fingerprints.json");
    let window = WindowSpec::parse("5m").unwrap();
    let source = FixedSource(vec![flat(0, 10.0), flat(60, 11.0), flat(120, 12.0)]);
    let emitter = JsonFileEmitter::new(&path);

    let first = run_match(
        &source,
        &mut MemoryStore::default(),
        &emitter,
        load_catalog(&path).unwrap(),
        &window,
        &request(),
    )
    .await
    .unwrap();
    assert!(matches!(first, MatchOutcome::Added(_)));
    assert_eq!(load_catalog(&path).unwrap().fingerprints().len(), 1);

    let second = run_match(
        &source,
        &mut MemoryStore::default(),
        &emitter,
        load_catalog(&path).unwrap(),
        &window,
        &request(),
    )
    .await
    .unwrap();
    assert_eq!(second.fingerprint(), first.fingerprint());
    assert!(matches!(second, MatchOutcome::Matched(_)));
    assert_eq!(load_catalog(&path).unwrap().fingerprints().len(), 1);
}

#[tokio::test]
async fn test_match_without_candles_is_an_error() {
    let err = run_match(
        &FixedSource(Vec::new()),
        &mut MemoryStore::default(),
        &CountingEmitter::default(),
        FingerprintCatalog::default(),
        &WindowSpec::parse("1h").unwrap(),
        &request(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::NotEnoughCandles(ref w) if w == "1h"));
}

#[tokio::test]
async fn test_offline_match_uses_archive_end_not_now() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("candles.csv");
    let history: Vec<Candle> = (0..30)
        .map(|i| flat(1_600_000_000 + i * 60, 50.0 + i as f64))
        .collect();
    CsvCandleStore::new(&archive)
        .archive(&CandleSeries::new(history).unwrap())
        .unwrap();

    let source = CsvCandleSource::new(&archive);
    let window = WindowSpec::parse("5m").unwrap();
    let request = match_request(&source, &AppConfig::default(), &window, Utc::now())
        .await
        .unwrap();
    assert_eq!(request.end, at(1_600_000_000 + 29 * 60));
    assert_eq!(request.start, at(1_600_000_000 + 24 * 60));

    let outcome = run_match(
        &source,
        &mut MemoryStore::default(),
        &CountingEmitter::default(),
        FingerprintCatalog::default(),
        &window,
        &request,
    )
    .await
    .unwrap();
    let fp = outcome.fingerprint();
    assert_eq!(fp.anchor_timestamp, request.end);
    assert_eq!(fp.candle_count, 6);
    assert_eq!(fp.close, 79.0);
}

#[tokio::test]
async fn test_live_match_range_ends_now() {
    let now = at(1_700_000_000);
    let window = WindowSpec::parse("1h").unwrap();
    let request = match_request(&FixedSource(Vec::new()), &AppConfig::default(), &window, now)
        .await
        .unwrap();
    assert_eq!(request.end, now);
    assert_eq!(request.start, at(1_700_000_000 - 3600));

    let config = AppConfig {
        start_date: Some("2023-11-14T00:00:00Z".to_string()),
        ..AppConfig::default()
    };
    let request = match_request(&FixedSource(Vec::new()), &config, &window, now)
        .await
        .unwrap();
    assert_eq!(request.start.to_rfc3339(), "2023-11-14T00:00:00+00:00");
}
