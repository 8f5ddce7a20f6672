//! Evidence photo index
//!
//! `created_at` is UTC RFC 3339 text at second precision, so it orders
//! lexicographically.

use chrono::{DateTime, SecondsFormat, Utc};
use promo_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PhotoRef {
    pub id: String,
    pub asset_key: String,
}

/// Photos recorded before `cutoff`, oldest first
pub async fn photos_older_than(pool: &SqlitePool, cutoff: DateTime<Utc>) -> Result<Vec<PhotoRef>> {
    let photos = sqlx::query_as::<_, PhotoRef>(
        "SELECT id, asset_key FROM evidence_photos WHERE created_at < ? ORDER BY created_at ASC",
    )
    .bind(stamp(cutoff))
    .fetch_all(pool)
    .await?;
    Ok(photos)
}

pub async fn delete_photo_row(pool: &SqlitePool, id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM evidence_photos WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Register an uploaded photo
pub async fn insert_photo(
    pool: &SqlitePool,
    sale_id: Option<&str>,
    asset_key: &str,
    created_at: DateTime<Utc>,
) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO evidence_photos (id, sale_id, asset_key, created_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(sale_id)
        .bind(asset_key)
        .bind(stamp(created_at))
        .execute(pool)
        .await?;
    Ok(id)
}

fn stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
