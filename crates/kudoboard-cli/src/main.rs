//! Kudoboard reclaim CLI: runs the orphaned object reclaimer once, as a daily
//! service, or inspects a storage prefix.
//!
//! Configuration comes from the environment (and `.env` when present).

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use kudoboard_cli::{format_objects_table, format_report_table, shutdown_signal};
use kudoboard_core::{Category, Config};
use kudoboard_db::{create_pool, ReferenceRepository};
use kudoboard_infra::{
    init_telemetry, shutdown_telemetry, OrphanReclaimer, ReclaimConfig, ReclaimScheduler,
};
use kudoboard_storage::{create_storage, keys, Storage};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "kudoboard-reclaim", about = "Kudoboard orphaned storage reclaimer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reclaim pass and print the report
    Run {
        /// Category name or key prefix to scan (repeatable; defaults to every category)
        #[arg(long = "prefix")]
        prefixes: Vec<String>,
        /// Report orphans without deleting them
        #[arg(long)]
        dry_run: bool,
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Run the daily reclaim scheduler until interrupted
    Serve,
    /// List one page of stored objects
    List {
        /// Category name or key prefix
        #[arg(long)]
        prefix: String,
        /// Continue after this key or public reference
        #[arg(long, default_value = "")]
        after: String,
        /// Maximum number of objects
        #[arg(long, default_value = "50")]
        limit: usize,
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Accept either a category name (`image`) or a raw key prefix (`image/2024/`).
fn resolve_prefix(arg: &str) -> anyhow::Result<String> {
    if let Ok(category) = arg.parse::<Category>() {
        return Ok(category.scan_prefix());
    }
    keys::validate_prefix(arg).with_context(|| format!("Invalid prefix: {}", arg))?;
    Ok(arg.to_string())
}

async fn build_reclaimer(
    config: &Config,
    storage: Arc<dyn Storage>,
    reclaim: ReclaimConfig,
) -> anyhow::Result<Arc<OrphanReclaimer>> {
    let pool = create_pool(config).await?;
    let references = Arc::new(ReferenceRepository::new(pool));
    Ok(Arc::new(OrphanReclaimer::new(storage, references, reclaim)))
}

async fn run_once(
    config: &Config,
    storage: Arc<dyn Storage>,
    prefixes: Vec<String>,
    dry_run: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut reclaim = ReclaimConfig::from_settings(config.reclaim());
    reclaim.dry_run = dry_run;
    if !prefixes.is_empty() {
        reclaim.prefixes = prefixes
            .iter()
            .map(|p| resolve_prefix(p))
            .collect::<anyhow::Result<_>>()?;
    }

    let reclaimer = build_reclaimer(config, storage, reclaim).await?;
    let token = CancellationToken::new();

    let run = reclaimer.try_run(&token);
    tokio::pin!(run);
    let report = tokio::select! {
        report = &mut run => report,
        _ = shutdown_signal() => {
            tracing::warn!("Interrupted, finishing current page");
            token.cancel();
            run.await
        }
    }
    .context("Reclaim run already in progress")?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print!("{}", format_report_table(&report)),
    }

    if report.total_errors > 0 {
        anyhow::bail!("Reclaim finished with {} errors", report.total_errors);
    }
    Ok(())
}

async fn serve(config: &Config, storage: Arc<dyn Storage>) -> anyhow::Result<()> {
    if !config.reclaim_enabled() {
        tracing::warn!("Orphan reclaim disabled (RECLAIM_ENABLED=false), nothing to serve");
        return Ok(());
    }

    let reclaim = ReclaimConfig::from_settings(config.reclaim());
    let reclaimer = build_reclaimer(config, storage, reclaim).await?;
    let scheduler = ReclaimScheduler::start(
        reclaimer,
        config.reclaim_run_at(),
        CancellationToken::new(),
    );

    tracing::info!(run_at = %config.reclaim_run_at(), "Reclaim scheduler started");
    shutdown_signal().await;
    tracing::info!("Shutting down gracefully...");
    scheduler.shutdown().await;
    Ok(())
}

async fn list(
    storage: Arc<dyn Storage>,
    prefix: &str,
    after: &str,
    limit: usize,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let prefix = resolve_prefix(prefix)?;
    let objects = storage
        .list_batch(&prefix, after, limit.max(1))
        .await
        .with_context(|| format!("List objects under {}", prefix))?;

    match format {
        OutputFormat::Json => print_json(&objects)?,
        OutputFormat::Table => {
            print!("{}", format_objects_table(&objects));
            if let Some(last) = objects.last() {
                println!("\nNext page: --after {}", last.public_ref);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Load configuration")?;
    init_telemetry(config.log_format(), config.environment())
        .map_err(|e| anyhow::anyhow!("Initialize telemetry: {}", e))?;

    let storage = create_storage(config.storage())
        .await
        .context("Initialize storage")?;

    let result = match cli.command {
        Commands::Run {
            prefixes,
            dry_run,
            format,
        } => run_once(&config, storage, prefixes, dry_run, format).await,
        Commands::Serve => serve(&config, storage).await,
        Commands::List {
            prefix,
            after,
            limit,
            format,
        } => list(storage, &prefix, &after, limit, format).await,
    };

    shutdown_telemetry().await;
    result
}
