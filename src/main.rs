//! Bountystats - embeddable statistics widget for a bounty board
//!
//! Pulls bounty data from the board's API, derives aggregate metrics,
//! caches them, and serves them as JSON, an HTML widget and an embed
//! script for iframe or script-tag embedding.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid arguments, config, bind failure, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod server;
mod stats;
mod upstream;
mod widget;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use stats::StatsAggregator;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use upstream::HttpBountySource;
use widget::WidgetOptions;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Bountystats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Fatal: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .bountystats.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the bounty API URL, port, cache TTL and widget theme.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over `--verbose` / `--quiet`.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Build the aggregator from configuration and either serve or print once.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let source = HttpBountySource::new(&config.upstream.api_url, config.upstream.timeout())?;
    info!(
        "Bounty API: {} (timeout {}s, cache ttl {}s)",
        source.base_url(),
        config.upstream.timeout_seconds,
        config.cache.ttl_seconds
    );

    let stats = Arc::new(StatsAggregator::new(Arc::new(source), config.cache.ttl()));

    if args.once {
        return print_once(&stats, &config, args.format).await;
    }

    let state = server::AppState {
        stats,
        widget: config.widget.clone(),
        public_url: config.server.effective_public_url(),
        refresh_seconds: config.cache.ttl_seconds,
    };

    server::serve(state, &config.server.bind_addr()).await
}

/// Handle --once: fetch a single snapshot and print it to stdout.
async fn print_once(stats: &StatsAggregator, config: &Config, format: OutputFormat) -> Result<()> {
    let result = stats.fetch_stats().await;
    info!("Stats source: {}", result.source);

    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&result.snapshot)
            .context("Failed to serialize stats")?,
        OutputFormat::Html => {
            let options = WidgetOptions {
                title: config.widget.title.clone(),
                theme: config.widget.default_theme,
                refresh_seconds: None,
            };
            widget::generate_widget_html(&result.snapshot, &options)
        }
    };

    println!("{}", output);
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
