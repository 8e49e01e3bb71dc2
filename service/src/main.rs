#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

use std::sync::Arc;
use std::time::Duration;

use chambers_engine::FeedTransport;
use chambers_service::{config::Config, transport::HttpFeedTransport, watch::Watcher};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Watch House and Senate floor status.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// YAML configuration file, overridden by `CHAMBERS_*` environment variables.
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// Run a single forced update, log the status and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Load and validate configuration first (fail-fast)
    let config = Config::load_from(&cli.config).map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.level)?)
        .init();

    // Init banner so container logs clearly show startup
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        house = config.house.enabled,
        senate = config.senate.enabled,
        cache = config.cache.enabled,
        "chambers-watch starting up"
    );

    let transport: Arc<dyn FeedTransport> = Arc::new(HttpFeedTransport::new(
        Duration::from_secs(config.http.timeout_secs),
        &config.http.user_agent,
    )?);
    let watcher = Watcher::from_config(&config, &transport)?;
    watcher.run(cli.once).await;

    Ok(())
}
