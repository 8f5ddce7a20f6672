//! Run log: one row per mutating command

use chrono::{DateTime, Utc};
use promo_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Record a finished run with its JSON summary
pub async fn record_run<S: Serialize>(
    pool: &SqlitePool,
    command: &str,
    source_sha256: Option<&str>,
    summary: &S,
    started_at: DateTime<Utc>,
) -> Result<String> {
    let summary_json = serde_json::to_string(summary)
        .map_err(|e| Error::Internal(format!("Failed to serialize run summary: {}", e)))?;

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO import_runs (id, command, source_sha256, summary, started_at, finished_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(command)
    .bind(source_sha256)
    .bind(summary_json)
    .bind(started_at.to_rfc3339())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(id)
}
