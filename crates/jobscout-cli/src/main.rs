//! Jobscout command line.
//!
//! `jobscout run` scrapes every configured facet into the database or a JSON
//! file. `jobscout list` shows what the database holds.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jobscout_browser::{BrowserEngine, LaunchOptions, PageDriver};
use jobscout_core::{AppConfig, BrowserConfig, OutputMode};
use jobscout_db::{count_postings, recent_postings, Database, JobStore};
use jobscout_scraper::{
    JsonFileSink, Orchestrator, RecordSink, RunControl, RunReport, RunStatus, StoreSink,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "jobscout", version, about = "Collect job postings into SQLite or JSON")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape every configured role and location
    Run {
        /// Config file, defaults to the per-user config path
        #[arg(long, env = "JOBSCOUT_CONFIG")]
        config: Option<PathBuf>,

        /// Write records to this JSON file instead of the database
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Show the number of stored postings and the newest ones
    List {
        /// Config file, defaults to the per-user config path
        #[arg(long, env = "JOBSCOUT_CONFIG")]
        config: Option<PathBuf>,

        /// Postings to show
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,jobscout=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    match Cli::parse().command {
        Commands::Run { config, json } => run(config.as_deref(), json).await,
        Commands::List { config, limit } => list(config.as_deref(), limit).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::load().context("failed to load config")?,
    }
    .with_env_overrides();

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn launch_options(browser: &BrowserConfig) -> LaunchOptions {
    if browser.proxy_username.is_some() || browser.proxy_password.is_some() {
        warn!("Proxy credentials are not passed to Chromium; configure an unauthenticated proxy");
    }

    LaunchOptions::randomized()
        .headless(browser.headless)
        .user_data_dir(&browser.user_data_dir)
        .proxy_server(browser.proxy_server.clone())
        .viewport(browser.window_width, browser.window_height)
        .navigation_timeout(browser.navigation_timeout())
}

async fn run(config_path: Option<&Path>, json: Option<PathBuf>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(path) = json {
        config.output.mode = OutputMode::Json;
        config.output.json_path = path;
    }

    info!("Starting jobscout v{}", env!("CARGO_PKG_VERSION"));

    let mut database = None;
    let mut sink: Box<dyn RecordSink> = match config.output.mode {
        OutputMode::Store => {
            let db = Database::new(&config.output.database_path)
                .await
                .with_context(|| format!("failed to open database {}", config.output.database_path))?;
            db.run_migrations().await.context("failed to create schema")?;
            let store = JobStore::new(db.pool().clone(), config.output.batch_size);
            database = Some(db);
            Box::new(StoreSink::new(store))
        }
        OutputMode::Json => Box::new(JsonFileSink::new(&config.output.json_path)),
    };

    let engine = Arc::new(
        BrowserEngine::launch(launch_options(&config.browser))
            .await
            .context("failed to launch browser")?,
    );
    let driver: Arc<dyn PageDriver> = engine.clone();
    let (mut orchestrator, control) = Orchestrator::new(driver, &config);

    let prompt = tokio::spawn(login_prompt(control));
    let result = orchestrator.run_until(sink.as_mut(), interrupted()).await;
    prompt.abort();
    drop(orchestrator);

    match Arc::try_unwrap(engine) {
        Ok(engine) => {
            if let Err(e) = engine.close().await {
                warn!("Failed to close browser: {}", e);
            }
        }
        Err(_) => warn!("Browser still in use, leaving it open"),
    }
    if let Some(db) = database {
        db.close().await;
    }

    let report = result.context("run aborted")?;
    print_summary(&report);
    Ok(())
}

/// Resolves on Ctrl-C. Never resolves when the handler cannot be installed.
async fn interrupted() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => warn!("Interrupted, finishing output before exit"),
        Err(e) => {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Ask for a manual login whenever the run is waiting for one.
async fn login_prompt(control: RunControl) {
    let mut status = control.status();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while status.changed().await.is_ok() {
        let current = status.borrow_and_update().clone();
        match current {
            RunStatus::NeedsAuthentication { facet, url } => {
                println!("Not signed in while searching {facet} ({url}).");
                println!("Sign in in the browser window, then press Enter to continue.");
                match lines.next_line().await {
                    Ok(Some(_)) => {
                        if !control.resume().await {
                            return;
                        }
                    }
                    Ok(None) => {
                        warn!("stdin closed, cannot resume");
                        return;
                    }
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        return;
                    }
                }
            }
            RunStatus::Finished | RunStatus::Stopped => return,
            RunStatus::Running => {}
        }
    }
}

fn print_summary(report: &RunReport) {
    if report.interrupted {
        println!("Run interrupted, partial results:");
    }
    println!("Facets processed:     {}", report.facets_processed);
    println!("Facets failed:        {}", report.facets_failed);
    println!("Links collected:      {}", report.links_collected);
    println!("Links processed:      {}", report.links_processed);
    println!("Records accepted:     {}", report.records.len());
    for (reason, count) in &report.skipped {
        println!("Skipped ({reason}): {count}");
    }
    println!("Off-role:             {}", report.role_filtered);
    println!("Duplicates:           {}", report.duplicates);
    println!("Extraction failures:  {}", report.extraction_failures);
    println!(
        "Store:                {} inserted, {} updated, {} failed",
        report.store_inserted, report.store_updated, report.store_failures
    );
}

async fn list(config_path: Option<&Path>, limit: u32) -> Result<()> {
    let config = load_config(config_path)?;
    let db = Database::new(&config.output.database_path)
        .await
        .with_context(|| format!("failed to open database {}", config.output.database_path))?;
    db.run_migrations().await.context("failed to create schema")?;

    let total = count_postings(db.pool()).await?;
    println!("{total} postings in {}", config.output.database_path);
    for posting in recent_postings(db.pool(), limit).await? {
        println!(
            "{:>6}  {}  {}  {}",
            posting.id, posting.created_at, posting.location, posting.title
        );
    }

    db.close().await;
    Ok(())
}
