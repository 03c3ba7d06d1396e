//! Cache Probe CLI
//!
//! Connects to Redis through the cache facade and checks it end to end.

use std::time::Duration;

use anyhow::{Context, Result};
use cache_facade::{CacheConfig, CacheFacade, shared_cache};
use cache_probe::{run_probe, watch};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "cache-probe")]
#[command(about = "Check connectivity to the Redis cache")]
struct Args {
    /// Redis URL (overrides REDIS_URL)
    #[arg(long)]
    url: Option<String>,

    /// Scratch key used for the round trip
    #[arg(short, long, default_value = "cache-probe:ping")]
    key: String,

    /// Expiration of the scratch key in seconds
    #[arg(long, default_value = "10")]
    ttl_secs: u64,

    /// Keep reporting connection events for this many seconds
    #[arg(long)]
    watch: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let mut config = CacheConfig::from_env();
    if let Some(url) = args.url {
        config = config.with_url(url);
    }

    tracing::info!(
        version = cache_facade::VERSION,
        url = %config.url,
        "Starting cache probe"
    );

    let cache = shared_cache(
        CacheFacade::connect(&config).context("Invalid Redis configuration")?,
    );

    let report = run_probe(&cache, &args.key, Duration::from_secs(args.ttl_secs))
        .await
        .context("Cache round trip failed")?;

    tracing::info!(
        alive = report.alive,
        read_back = report.read_back,
        deleted = report.deleted,
        elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
        "Probe finished"
    );

    if let Some(secs) = args.watch {
        tracing::info!(secs, "Watching connection events");
        let seen = watch(&cache, Duration::from_secs(secs)).await;
        tracing::info!(events = seen, alive = cache.is_alive(), "Watch finished");
    }

    if !report.is_healthy() {
        anyhow::bail!("cache probe unhealthy: {report:?}");
    }

    Ok(())
}
