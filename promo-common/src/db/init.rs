//! Database initialization
//!
//! Every table is created with `CREATE TABLE IF NOT EXISTS`, so opening an
//! existing store is a no-op apart from the connection pragmas.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Connect to the relational store at `database_url` and ensure the schema exists
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    // Runs are sequential; a small pool is enough for the janitor's handlers
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;
    info!("Database ready");

    Ok(pool)
}

/// Open or create a file-backed store
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = connect(&db_url).await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_stores_table(pool).await?;
    create_accounts_table(pool).await?;
    create_promoters_table(pool).await?;
    create_sales_table(pool, "legacy_sales").await?;
    create_sales_table(pool, "sales").await?;
    create_area_hierarchy_table(pool).await?;
    create_evidence_photos_table(pool).await?;
    create_import_runs_table(pool).await?;
    Ok(())
}

async fn create_stores_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stores (
            store_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            area_label TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_accounts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            role TEXT NOT NULL,
            area TEXT,
            sator TEXT,
            secret_hash TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_accounts_role_area ON accounts(role, area)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_promoters_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS promoters (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            sator TEXT,
            target INTEGER NOT NULL DEFAULT 0,
            store_id TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            employee_id TEXT UNIQUE,
            pin_hash TEXT,
            user_id TEXT,
            supervisor_id TEXT,
            area TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Both fact tables share one shape
async fn create_sales_table(pool: &SqlitePool, table: &str) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY,
            sale_date TEXT NOT NULL,
            status TEXT NOT NULL,
            status_raw TEXT,
            promoter_name TEXT NOT NULL,
            store_id TEXT NOT NULL,
            phone_type TEXT,
            customer_name TEXT,
            occupation TEXT,
            created_by TEXT NOT NULL,
            deleted_at TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{table}_sale_date ON {table}(sale_date)"
    ))
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_area_hierarchy_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS area_hierarchy (
            area TEXT NOT NULL,
            sator TEXT NOT NULL,
            manager_name TEXT,
            manager_account_id TEXT,
            sator_account_id TEXT,
            promoter_count INTEGER NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (area, sator)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_evidence_photos_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS evidence_photos (
            id TEXT PRIMARY KEY,
            sale_id TEXT,
            asset_key TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_import_runs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS import_runs (
            id TEXT PRIMARY KEY,
            command TEXT NOT NULL,
            source_sha256 TEXT,
            summary TEXT NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
