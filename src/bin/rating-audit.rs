//! # Gang Rating Audit
//!
//! Recomputes gang ratings from the fighter graph and reports every gang whose
//! stored `rating` column disagrees. With `--fix` the column is rewritten and
//! the gang's cache entries are invalidated.

use anyhow::{Context, Result};
use clap::Parser;
use gangkeeper_core::config::ConfigLoader;
use gangkeeper_core::database::DatabaseConnection;
use gangkeeper_core::logging::init_structured_logging;
use gangkeeper_core::services::{RatingReconciliation, RatingService};
use gangkeeper_core::store::{EntityStore, PgEntityStore};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "rating-audit")]
#[command(about = "Compare stored gang ratings with recomputed ones")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to load configuration for (defaults to GANGKEEPER_ENV)
    #[arg(short, long)]
    environment: Option<String>,

    /// Configuration directory path (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Gangs to audit; all gangs when omitted
    #[arg(short, long = "gang")]
    gangs: Vec<Uuid>,

    /// Write recomputed ratings back to the stored column
    #[arg(long)]
    fix: bool,

    /// Apply pending migrations before auditing
    #[arg(long)]
    migrate: bool,

    /// Output format (table, json)
    #[arg(long, default_value = "table")]
    format: String,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // without -v, RUST_LOG and the environment decide
    if cli.verbose == 0 {
        init_structured_logging();
    } else {
        let level = match cli.verbose {
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        let _subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .try_init();
    }

    match run(&cli).await {
        Ok(drifted) if drifted > 0 && !cli.fix => {
            info!(drifted = drifted, "Stored ratings disagree with aggregation");
            process::exit(2);
        }
        Ok(_) => process::exit(0),
        Err(e) => {
            error!("Rating audit failed: {e:#}");
            process::exit(1);
        }
    }
}

/// Returns the number of gangs whose stored rating drifted
async fn run(cli: &Cli) -> Result<usize> {
    let environment = cli
        .environment
        .clone()
        .unwrap_or_else(ConfigLoader::detect_environment);
    let config_dir = cli
        .config_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("config"));
    let config = ConfigLoader::load_from_directory_with_env(&config_dir, &environment)
        .context("loading configuration")?;

    let db = DatabaseConnection::new(&config.database)
        .await
        .context("connecting to database")?;
    if !db.health_check().await.context("checking database health")? {
        anyhow::bail!("database health check failed");
    }
    if cli.migrate {
        db.migrate().await.context("applying migrations")?;
    }
    let store = Arc::new(PgEntityStore::new(db.pool().clone()));

    let gang_ids = if cli.gangs.is_empty() {
        store.gang_ids().await.context("listing gangs")?
    } else {
        cli.gangs.clone()
    };

    let service = RatingService::from_config(store, &config);
    let mut results = Vec::with_capacity(gang_ids.len());
    for gang_id in gang_ids {
        let result = if cli.fix {
            service.reconcile_stored_rating(gang_id).await
        } else {
            service.audit_stored_rating(gang_id).await
        }
        .with_context(|| format!("auditing gang {gang_id}"))?;
        results.push(result);
    }

    let drifted = results.iter().filter(|r| !r.is_consistent()).count();
    match cli.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&results)?),
        _ => print_table(&results),
    }

    db.close().await;
    Ok(drifted)
}

fn print_table(results: &[RatingReconciliation]) {
    println!(
        "{:<38} {:>10} {:>10} {:>8}",
        "gang", "stored", "computed", "status"
    );
    for r in results {
        let stored = r
            .stored
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        let status = match (r.stored, r.updated) {
            (None, _) => "missing",
            (Some(_), true) => "fixed",
            (Some(_), false) if r.is_consistent() => "ok",
            (Some(_), false) => "DRIFT",
        };
        println!(
            "{:<38} {:>10} {:>10} {:>8}",
            r.gang_id, stored, r.computed, status
        );
    }
}
