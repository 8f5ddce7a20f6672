//! Promoter rows
//!
//! Spreadsheet re-imports refresh descriptive columns only. Assignment
//! columns (`employee_id`, `user_id`, `pin_hash`, `supervisor_id`, `area`)
//! are written solely by the hierarchy engine.

use promo_common::db::Area;
use promo_common::Result;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::extract::PromoterDraft;

/// Promoter still lacking a linked account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlinkedPromoter {
    pub id: String,
    pub name: String,
    pub sator: Option<String>,
    pub store_id: Option<String>,
    pub store_area_label: Option<String>,
    pub employee_id: Option<String>,
}

/// Columns written when a promoter is linked
#[derive(Debug, Clone)]
pub struct PromoterLink<'a> {
    pub employee_id: &'a str,
    pub area: Area,
    pub user_id: &'a str,
    pub pin_hash: &'a str,
    pub supervisor_id: &'a str,
}

/// Insert or refresh one chunk of promoters, keyed by name
pub async fn upsert_promoters(pool: &SqlitePool, chunk: &[PromoterDraft]) -> Result<u64> {
    if chunk.is_empty() {
        return Ok(0);
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT INTO promoters (id, name, sator, target, store_id, is_active) ");
    qb.push_values(chunk, |mut b, p| {
        b.push_bind(Uuid::new_v4().to_string())
            .push_bind(p.name.clone())
            .push_bind(p.sator.clone())
            .push_bind(p.target)
            .push_bind(p.store_id.clone())
            .push_bind(p.is_active);
    });
    qb.push(
        " ON CONFLICT(name) DO UPDATE SET \
         sator = excluded.sator, \
         target = excluded.target, \
         store_id = excluded.store_id, \
         is_active = excluded.is_active, \
         updated_at = CURRENT_TIMESTAMP",
    );

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected())
}

/// Promoters without `user_id`, in processing order
pub async fn load_unlinked(pool: &SqlitePool) -> Result<Vec<UnlinkedPromoter>> {
    let rows = sqlx::query(
        r#"
        SELECT p.id, p.name, p.sator, p.store_id, p.employee_id, s.area_label
        FROM promoters p
        LEFT JOIN stores s ON s.store_id = p.store_id
        WHERE p.user_id IS NULL
        ORDER BY p.created_at ASC, p.rowid ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| UnlinkedPromoter {
            id: row.get("id"),
            name: row.get("name"),
            sator: row.get("sator"),
            store_id: row.get("store_id"),
            store_area_label: row.get("area_label"),
            employee_id: row.get("employee_id"),
        })
        .collect())
}

/// Every employee identifier already issued
pub async fn employee_ids(pool: &SqlitePool) -> Result<Vec<String>> {
    let ids: Vec<String> =
        sqlx::query_scalar("SELECT employee_id FROM promoters WHERE employee_id IS NOT NULL")
            .fetch_all(pool)
            .await?;
    Ok(ids)
}

/// Link a promoter to its new account. Returns false if it was linked concurrently.
pub async fn link_promoter(pool: &SqlitePool, promoter_id: &str, link: &PromoterLink<'_>) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE promoters
        SET employee_id = ?, area = ?, user_id = ?, pin_hash = ?, supervisor_id = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND user_id IS NULL
        "#,
    )
    .bind(link.employee_id)
    .bind(link.area.code())
    .bind(link.user_id)
    .bind(link.pin_hash)
    .bind(link.supervisor_id)
    .bind(promoter_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Active promoter counts per (area, sator), assigned agents only
pub async fn count_by_area_and_sator(pool: &SqlitePool) -> Result<Vec<(String, String, i64)>> {
    let rows: Vec<(String, String, i64)> = sqlx::query_as(
        r#"
        SELECT area, TRIM(sator) AS sator, COUNT(*) AS promoter_count
        FROM promoters
        WHERE is_active = 1
          AND area IS NOT NULL
          AND sator IS NOT NULL
          AND TRIM(sator) <> ''
        GROUP BY area, TRIM(sator)
        ORDER BY area, TRIM(sator)
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
