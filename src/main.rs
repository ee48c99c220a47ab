use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use price_fingerprints::artifact::{JsonFileEmitter, load_catalog, preview};
use price_fingerprints::config::AppConfig;
use price_fingerprints::fingerprint::WindowSpec;
use price_fingerprints::logging;
use price_fingerprints::market::{
    CandleSource, CsvCandleSource, CsvCandleStore, KlineRequest, new_binance_client,
};
use price_fingerprints::matching::{MatchOutcome, match_request, run_match};
use price_fingerprints::pipeline::run_build;

const PREVIEW_ROWS: usize = 5;

/// price-fingerprints – trailing-window summaries of price action
#[derive(Parser, Debug)]
#[command(name = "price-fingerprints")]
#[command(about = "Build and match price fingerprint catalogs", long_about = None)]
struct Cli {
    /// TOML config file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch candles and write the full fingerprint catalog
    Build {
        #[command(flatten)]
        source: SourceArgs,

        /// Earliest candle to fetch (ISO-8601). Defaults to now minus --period
        #[arg(long)]
        start_date: Option<String>,

        /// Where the catalog JSON is written
        #[arg(long)]
        output: Option<PathBuf>,

        /// Comma-separated window labels, e.g. 1m,5m,1h
        #[arg(long, value_delimiter = ',')]
        windows: Option<Vec<String>>,

        /// Sweep windows one after another instead of in parallel
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },

    /// Fingerprint the latest window and look it up in a catalog
    Match {
        #[command(flatten)]
        source: SourceArgs,

        /// Window label to match, e.g. 1h
        #[arg(long)]
        window: String,

        /// Fetch from here instead of one window before the newest candle (ISO-8601)
        #[arg(long)]
        start_date: Option<String>,

        /// Catalog to match against (and append to)
        #[arg(long)]
        fingerprints: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Exchange symbol, e.g. BTCUSDT
    #[arg(long)]
    symbol: Option<String>,

    /// Candle interval, e.g. 1m
    #[arg(long)]
    interval: Option<String>,

    /// Lookback when no start date is given, e.g. 7d, 24h, 60m
    #[arg(long)]
    period: Option<String>,

    /// Raw candle archive (CSV)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Read candles from this CSV instead of the exchange
    #[arg(long)]
    candles: Option<PathBuf>,

    /// Exchange WebSocket API URL override
    #[arg(long)]
    endpoint: Option<String>,
}

impl SourceArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(symbol) = &self.symbol {
            config.symbol = symbol.clone();
        }
        if let Some(interval) = &self.interval {
            config.interval = interval.clone();
        }
        if let Some(period) = &self.period {
            config.period = period.clone();
        }
        if let Some(store) = &self.store {
            config.store_path = store.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Build {
            source,
            start_date,
            output,
            windows,
            sequential,
        } => {
            source.apply(&mut config);
            if start_date.is_some() {
                config.start_date = start_date;
            }
            if let Some(output) = output {
                config.output = output;
            }
            if let Some(windows) = windows {
                config.windows = windows;
            }
            if sequential {
                config.parallel = false;
            }

            match &source.candles {
                Some(path) => build(&CsvCandleSource::new(path), &config).await,
                None => build(&network_source(&config), &config).await,
            }
        }
        Command::Match {
            source,
            window,
            start_date,
            fingerprints,
        } => {
            source.apply(&mut config);
            if start_date.is_some() {
                config.start_date = start_date;
            }
            if let Some(fingerprints) = fingerprints {
                config.output = fingerprints;
            }
            let window = WindowSpec::parse(&window).context("invalid --window")?;

            match &source.candles {
                Some(path) => match_latest(&CsvCandleSource::new(path), &config, &window).await,
                None => match_latest(&network_source(&config), &config, &window).await,
            }
        }
    }
}

fn network_source(config: &AppConfig) -> price_fingerprints::market::providers::BinanceClient {
    let client = new_binance_client();
    match &config.endpoint {
        Some(endpoint) => client.with_endpoint(endpoint.clone()),
        None => client,
    }
}

async fn build<S: CandleSource>(source: &S, config: &AppConfig) -> Result<()> {
    // Window problems surface before anything is fetched
    let builder = config.catalog_builder().context("invalid window configuration")?;
    let now = Utc::now();
    let start = config.resolve_start(now).context("resolving start date")?;
    let request = KlineRequest::new(&config.symbol, &config.interval, start, now);

    let mut store = CsvCandleStore::new(&config.store_path);
    let emitter = JsonFileEmitter::new(&config.output);
    let catalog = run_build(source, &mut store, &emitter, &builder, &request)
        .await
        .context("building fingerprint catalog")?;

    print!("{}", preview(&catalog, PREVIEW_ROWS));
    println!(
        "Saved {} fingerprints to {}",
        catalog.fingerprints().len(),
        config.output.display()
    );
    Ok(())
}

async fn match_latest<S: CandleSource>(
    source: &S,
    config: &AppConfig,
    window: &WindowSpec,
) -> Result<()> {
    let request = match_request(source, config, window, Utc::now())
        .await
        .context("resolving match range")?;

    let catalog = load_catalog(&config.output).context("loading fingerprint catalog")?;
    info!(existing = catalog.fingerprints().len(), "catalog loaded");

    let mut store = CsvCandleStore::new(&config.store_path);
    let emitter = JsonFileEmitter::new(&config.output);
    let outcome = run_match(source, &mut store, &emitter, catalog, window, &request)
        .await
        .context("matching latest fingerprint")?;

    match outcome {
        MatchOutcome::Matched(fp) => {
            println!("Found matching fingerprint for window {}: {}", window, fp.fingerprint_id)
        }
        MatchOutcome::Added(fp) => {
            println!("Added new fingerprint for window {}: {}", window, fp.fingerprint_id)
        }
    }
    Ok(())
}
