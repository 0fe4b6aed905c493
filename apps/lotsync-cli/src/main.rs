//! lotsync CLI - mirror a dealer vehicle catalog into a CMS collection.
//!
//! One `sync` invocation runs one bounded reconciliation pass; `census`
//! and `features` are read-only catalog reports.

use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;
mod error;

use config::Config;
use error::CliResult;
use lotsync_engine::{
    census, feature_frequency, CatalogClient, CmsClient, Credentials, FileCursorStore,
    ProxyMediaResolver, Reconciler, ReconcilerConfig, ReferenceCache, VehicleMapper,
};

/// Timeout applied to every outbound HTTP call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// lotsync - catalog to CMS delta synchronization
#[derive(Parser)]
#[command(name = "lotsync")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass against the destination collection
    Sync(SyncArgs),

    /// Summarize which catalog records are publicly listable
    Census,

    /// Count feature labels across the catalog
    Features,
}

#[derive(Args)]
struct SyncArgs {
    /// Per-lane batch budget (clamped to 25)
    #[arg(long)]
    limit: Option<usize>,

    /// Compute the full plan but suppress every destination mutation
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => {}
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = Config::from_env()?;

    match cli.command {
        Commands::Sync(args) => sync(&config, &args).await,
        Commands::Census => report_census(&config).await,
        Commands::Features => report_features(&config).await,
    }
}

async fn sync(config: &Config, args: &SyncArgs) -> CliResult<()> {
    let catalog = CatalogClient::new(
        &config.source_url,
        Credentials::basic(&config.source_user, &config.source_pass),
        HTTP_TIMEOUT,
    )?;
    let store = CmsClient::new(&config.cms_url, &config.cms_token, HTTP_TIMEOUT)
        .map_err(lotsync_engine::SyncError::from)?;

    let engine_config = ReconcilerConfig::new(&config.listing_collection)
        .with_batch_limit(args.limit.unwrap_or(config.batch_limit))
        .with_requests_per_minute(config.requests_per_minute);

    tracing::info!(
        limit = engine_config.batch_limit,
        dry_run = args.dry_run,
        "Invoking reconciliation pass"
    );

    let reconciler = Reconciler::new(
        engine_config,
        Arc::new(catalog),
        Arc::new(store),
        Arc::new(FileCursorStore::new(&config.cursor_dir)),
        Arc::new(VehicleMapper::new()),
        Arc::new(ProxyMediaResolver::new(&config.media_origin)),
        Arc::new(ReferenceCache::new(&config.feature_collection)),
    );

    let summary = reconciler.run(args.dry_run).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    // A completed pass is a success even when single records failed;
    // callers inspect the errors list in the printed summary.
    if summary.has_failures() {
        eprintln!("warning: {} record(s) failed, see errors list", summary.failed);
    }
    Ok(())
}

async fn report_census(config: &Config) -> CliResult<()> {
    let snapshot = catalog_client(config)?.fetch_snapshot().await?;
    let census = census(&snapshot);
    println!("{}", serde_json::to_string_pretty(&census)?);
    Ok(())
}

async fn report_features(config: &Config) -> CliResult<()> {
    let snapshot = catalog_client(config)?.fetch_snapshot().await?;
    let features = feature_frequency(&snapshot);
    println!("{}", serde_json::to_string_pretty(&features)?);
    Ok(())
}

fn catalog_client(config: &Config) -> CliResult<CatalogClient> {
    Ok(CatalogClient::new(
        &config.source_url,
        Credentials::basic(&config.source_user, &config.source_pass),
        HTTP_TIMEOUT,
    )?)
}
