// src/main.rs
// =============================================================================
// This is the entry point of our application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging
// 3. Dispatch to the subcommand: `serve` runs the pipeline + HTTP API,
//    `titles` prints what is already stored
// 4. Exit with proper code (0 = success, 2 = error)
//
// Wiring (serve):
//   HTTP /load_urls -> Submitter -> queue -> WorkerPool -> SqliteStore
//   HTTP /get_titles ---------------------------------------> SqliteStore
// The queue, DedupStore and store are built once here and handed to the
// pieces that use them.
// =============================================================================

mod api;
mod cli;
mod fetcher;
mod pipeline;
mod store;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ServeArgs};
use fetcher::{FetcherConfig, HttpFetcher};
use pipeline::{DedupStore, StoreFailurePolicy, Submitter, WorkerContext, WorkerPool};
use store::{FetchRecord, SqliteStore, TitleSink};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Serve(args) => handle_serve(args).await,
        Commands::Titles { database, json } => handle_titles(&database, json).await,
    }
}

// RUST_LOG wins; without it we log at info
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// Handles the 'serve' subcommand
async fn handle_serve(args: ServeArgs) -> Result<i32> {
    let store = Arc::new(
        SqliteStore::open(&args.database)
            .with_context(|| format!("cannot open database {}", args.database.display()))?,
    );
    info!("using database {}", args.database.display());

    let mut fetcher_config = FetcherConfig {
        timeout: Duration::from_secs(args.fetch_timeout_secs),
        connect_timeout: Duration::from_secs(args.connect_timeout_secs),
        max_redirects: args.max_redirects,
        ..FetcherConfig::default()
    };
    if let Some(user_agent) = args.user_agent {
        fetcher_config.user_agent = user_agent;
    }
    let fetcher = Arc::new(HttpFetcher::new(&fetcher_config).context("cannot build HTTP client")?);

    let dedup = Arc::new(DedupStore::new());
    let (queue_tx, queue_rx) = pipeline::unbounded();

    let pool = WorkerPool::spawn(
        usize::from(args.workers),
        queue_rx,
        WorkerContext {
            dedup: Arc::clone(&dedup),
            fetcher,
            sink: store.clone(),
            on_store_failure: if args.release_on_store_failure {
                StoreFailurePolicy::Release
            } else {
                StoreFailurePolicy::KeepCompleted
            },
        },
    );

    info!("{} workers waiting for URLs", pool.size());

    let state = api::AppState {
        submitter: Submitter::new(queue_tx, Arc::clone(&dedup)),
        dedup,
        store,
    };

    let served = api::serve(args.bind, state, shutdown_signal()).await;

    // Queued and in-flight URLs are dropped here
    pool.shutdown().await;

    served.map(|()| 0)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

// Handles the 'titles' subcommand
async fn handle_titles(database: &std::path::Path, json: bool) -> Result<i32> {
    let store = SqliteStore::open(database)
        .with_context(|| format!("cannot open database {}", database.display()))?;
    let records = store.query_all().await?;

    print_results(&records, json)?;
    Ok(0)
}

// Prints the records either as a table or JSON
fn print_results(records: &[FetchRecord], json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(records)?;
        println!("{}", json_output);
    } else {
        print_table(records);
    }
    Ok(())
}

// Prints records as a human-readable table in the terminal
fn print_table(records: &[FetchRecord]) {
    println!("{:<60} {:<20} {:<40}", "URL", "FETCHED (UTC)", "TITLE");
    println!("{}", "=".repeat(120));

    for record in records {
        let url_display = truncate_display(&record.url, 57);
        let fetched = record
            .fetched_at()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();

        println!("{:<60} {:<20} {:<40}", url_display, fetched, record.title);
    }

    println!();
    println!("📋 Total: {}", records.len());
}

// Shortens long values for display, on a character boundary
fn truncate_display(value: &str, max_chars: usize) -> String {
    if value.chars().count() > max_chars {
        let cut: String = value.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        value.to_string()
    }
}
