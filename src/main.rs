use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use siphon::config::Config;
use siphon::ingest::{self, IngestError, IngestOptions};
use siphon::storage::{Database, DatabaseError};

/// Get the config directory path (~/.config/siphon/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("siphon");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(
    name = "siphon",
    about = "RSS/Atom feed ingester with per-feed date-format learning"
)]
struct Args {
    /// Database file path (overrides config)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Config file path (default ~/.config/siphon/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reset database (delete and recreate)
    #[arg(long)]
    reset_db: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Set up config directory
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    let config_path = args
        .config
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path).context("Failed to load configuration")?;

    let db_path = args
        .db
        .or_else(|| config.database_path.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| config_dir.join("feeds.db"));

    // Handle --reset-db flag
    if args.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        println!("Database reset.");
    }

    // Open database
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of siphon appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .build()
        .context("Failed to build HTTP client")?;

    let options = IngestOptions {
        fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
        max_concurrent_fetches: config.max_concurrent_fetches,
    };

    let outcomes = match ingest::run(&db, &client, &options).await {
        Ok(outcomes) => outcomes,
        Err(e @ IngestError::UnimplementedFeedType { .. }) => {
            // Deliberate hard stop: surfacing the gap beats silently
            // misparsing a feed someone declared as custom.
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let mut inserted = 0;
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(stats) => {
                inserted += stats.inserted;
                tracing::info!(
                    feed = %outcome.name,
                    inserted = stats.inserted,
                    duplicates = stats.duplicates,
                    skipped = stats.skipped_items,
                    "Feed ingested"
                );
            }
            Err(e) => {
                failed += 1;
                eprintln!("Can't ingest feed {}: {}", outcome.name, e);
            }
        }
    }

    println!(
        "Ingested {} new posts from {} feeds ({} failed).",
        inserted,
        outcomes.len(),
        failed
    );

    Ok(())
}
