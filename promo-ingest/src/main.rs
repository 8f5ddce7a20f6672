//! promo-ingest - one-shot reconciliation commands
//!
//! Each subcommand prints a summary to stdout. Configuration failures and
//! verification violations exit non-zero; per-record failures do not.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use promo_common::config::EngineConfig;
use promo_common::db::{connect, DateWindow, FactTable};
use std::path::PathBuf;
use tracing::info;

use promo_ingest::commands;

#[derive(Parser, Debug)]
#[command(name = "promo-ingest", version, about = "Sales workbook reconciliation engine")]
struct Args {
    /// Config file (overrides PROMO_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database URL (overrides the config file)
    #[arg(long, global = true, env = "PROMO_DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upsert stores and promoters from the workbook
    ImportMaster {
        #[arg(long)]
        file: PathBuf,
    },
    /// Replay one date window of sales into the target fact table
    Reconcile {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// legacy | successor
        #[arg(long)]
        target: FactTable,
        /// Recorded as created_by on every inserted row
        #[arg(long)]
        actor: String,
    },
    /// Link unassigned promoters to areas, supervisors and accounts
    AssignHierarchy,
    /// Recompute the area hierarchy aggregate
    RebuildHierarchy,
    /// Create or update accounts from a TOML identity list
    Provision {
        #[arg(long)]
        file: PathBuf,
    },
    /// Check the partition invariants without writing
    Verify {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long)]
        target: FactTable,
    },
    /// Delete evidence photos past retention
    Cleanup,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting promo-ingest v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let config = EngineConfig::load(args.config.as_deref(), args.database_url.clone())
        .context("Failed to load configuration")?;
    let database_url = config.require_database_url()?;
    let pool = connect(database_url)
        .await
        .context("Failed to open database")?;
    info!("Database connected");

    match args.command {
        Command::ImportMaster { file } => {
            let summary = commands::import_master(&pool, &config, &file).await?;
            println!("{}", summary);
        }
        Command::Reconcile {
            file,
            start,
            end,
            target,
            actor,
        } => {
            let window = DateWindow::new(start, end)?;
            let summary = commands::reconcile(&pool, &config, &file, window, target, &actor).await?;
            println!("{}", summary);
            if !summary.report.verification.is_clean() {
                bail!("Partition verification failed for {}", window);
            }
        }
        Command::AssignHierarchy => {
            let report = commands::assign(&pool, &config).await?;
            println!("{}", report);
        }
        Command::RebuildHierarchy => {
            let summary = commands::rebuild(&pool).await?;
            println!("{}", summary);
        }
        Command::Provision { file } => {
            let summary = commands::provision_file(&pool, &config, &file).await?;
            println!("{}", summary);
        }
        Command::Verify { start, end, target } => {
            let window = DateWindow::new(start, end)?;
            let report = commands::verify(&pool, &config, window, target).await?;
            println!("{}", report);
            if !report.is_clean() {
                bail!("Partition verification failed for {}", window);
            }
        }
        Command::Cleanup => {
            let report = commands::cleanup(&pool, &config, Utc::now()).await?;
            println!("{}", report);
        }
    }

    pool.close().await;
    Ok(())
}
