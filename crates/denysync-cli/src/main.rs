use std::path::Path;

use anyhow::{anyhow, Context};
use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use denysync_cli::{Command, Config};
use denysync_client::{HttpSourceFetcher, NextDnsClient};
use denysync_core::{
    collect_desired, load_settings, parse_registry, AppError, ApplySummary, ChunkOutcome, Delta,
    HttpConfig, ReconcileOutcome, Reconciler, RemoteConfig, SyncConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Parse command line arguments
    let config = Config::parse();

    // Setup logging (stderr to keep stdout clean for export/plan output)
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if config.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let settings = load_settings(config.settings.as_deref()).map_err(fatal)?;
    let http = HttpConfig::from_settings(&config.http_settings().or(settings.http));
    let sync = SyncConfig::from_settings(&config.sync_settings().or(settings.sync)).map_err(fatal)?;

    match &config.command {
        Command::Sync { dry_run } => {
            let remote = remote_config(&config)?;
            let sources = read_sources(&config.sources)?;
            if *dry_run {
                plan(&remote, &http, &sync, &sources).await?;
            } else {
                reconcile(&remote, &http, &sync, &sources).await?;
            }
        }
        Command::Plan => {
            let remote = remote_config(&config)?;
            let sources = read_sources(&config.sources)?;
            plan(&remote, &http, &sync, &sources).await?;
        }
        Command::Export => {
            let sources = read_sources(&config.sources)?;
            export(&http, &sync, &sources).await?;
        }
    }

    Ok(())
}

/// Logs a fatal error and turns it into the process error.
fn fatal(e: AppError) -> anyhow::Error {
    error!("{}", e);
    anyhow!(e.user_message())
}

fn remote_config(config: &Config) -> anyhow::Result<RemoteConfig> {
    RemoteConfig::new(
        config.api_key.clone(),
        config.profile_id.clone(),
        &config.api_url,
    )
    .map_err(fatal)
}

/// Read the source registry file
fn read_sources(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sources file {}", path.display()))?;
    let sources = parse_registry(&content);
    if sources.is_empty() {
        warn!("No sources listed in {}", path.display());
    }
    Ok(sources)
}

/// Reconcile the remote denylist with the configured sources
async fn reconcile(
    remote: &RemoteConfig,
    http: &HttpConfig,
    sync: &SyncConfig,
    sources: &[String],
) -> anyhow::Result<()> {
    let store = NextDnsClient::new(remote, http).map_err(fatal)?;
    let fetcher = HttpSourceFetcher::new(http).map_err(fatal)?;
    info!("Reconciling denylist at {}", store.endpoint());

    let outcome = Reconciler::new(&store, &fetcher, sync)
        .run(sources)
        .await
        .map_err(fatal)?;

    let failed = outcome.failed_chunks();
    match outcome {
        ReconcileOutcome::UpToDate => {
            println!("\nDenylist is up to date. No changes needed.\n");
        }
        ReconcileOutcome::Completed { added, removed } => {
            println!("\nReconciliation Summary\n");
            print_summary(&added);
            print_summary(&removed);
            println!();
        }
    }

    if failed > 0 {
        warn!(
            "{} chunk(s) were not applied; run again to retry the remaining changes",
            failed
        );
    }

    Ok(())
}

fn print_summary(summary: &ApplySummary) {
    println!(
        "  {:<8} {} domains applied in {} chunk(s), {} chunk(s) failed",
        summary.action,
        summary.applied_domains(),
        summary.succeeded_chunks(),
        summary.failed_chunks()
    );
    for outcome in &summary.outcomes {
        if let ChunkOutcome::Failed {
            index,
            domains,
            message,
            ..
        } = outcome
        {
            println!("    chunk {} ({} domains): {}", index + 1, domains, message);
        }
    }
}

/// Print the pending changes without applying them
async fn plan(
    remote: &RemoteConfig,
    http: &HttpConfig,
    sync: &SyncConfig,
    sources: &[String],
) -> anyhow::Result<()> {
    let store = NextDnsClient::new(remote, http).map_err(fatal)?;
    let fetcher = HttpSourceFetcher::new(http).map_err(fatal)?;

    let delta = Reconciler::new(&store, &fetcher, sync)
        .plan(sources)
        .await
        .map_err(fatal)?;

    print_delta(&delta);
    Ok(())
}

fn print_delta(delta: &Delta) {
    for domain in &delta.to_add {
        println!("+ {}", domain);
    }
    for domain in &delta.to_remove {
        println!("- {}", domain);
    }
    info!(
        "{} to add, {} to remove (dry run, nothing applied)",
        delta.to_add.len(),
        delta.to_remove.len()
    );
}

/// Export the desired set as a plain domain list
async fn export(http: &HttpConfig, sync: &SyncConfig, sources: &[String]) -> anyhow::Result<()> {
    let fetcher = HttpSourceFetcher::new(http).map_err(fatal)?;
    let summary = collect_desired(&fetcher, sources, sync.source_concurrency).await;

    if summary.desired.is_empty() {
        eprintln!("No domains collected.");
        return Ok(());
    }

    for domain in &summary.desired {
        println!("{}", domain);
    }

    info!("Export complete: {} domains", summary.desired.len());
    Ok(())
}
