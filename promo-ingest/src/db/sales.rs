//! Fact table access for `legacy_sales` and `sales`
//!
//! Dates are stored as `YYYY-MM-DD` text, so string comparison is date
//! comparison. "Live" rows have `deleted_at IS NULL`.

use chrono::{NaiveDate, Utc};
use promo_common::db::{DateWindow, DeleteMode, FactTable};
use promo_common::{Error, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::extract::SaleDraft;
use crate::normalize::format_canonical;

/// Insert one chunk of sales attributed to `actor`
pub async fn insert_sales(
    pool: &SqlitePool,
    table: FactTable,
    chunk: &[SaleDraft],
    actor: &str,
) -> Result<u64> {
    if chunk.is_empty() {
        return Ok(0);
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "INSERT INTO {} (id, sale_date, status, status_raw, promoter_name, store_id, \
         phone_type, customer_name, occupation, created_by) ",
        table.table_name()
    ));
    qb.push_values(chunk, |mut b, sale| {
        b.push_bind(Uuid::new_v4().to_string())
            .push_bind(format_canonical(sale.sale_date))
            .push_bind(sale.status.as_str())
            .push_bind(sale.status_raw.clone())
            .push_bind(sale.promoter_name.clone())
            .push_bind(sale.store_id.clone())
            .push_bind(sale.phone_type.clone())
            .push_bind(sale.customer_name.clone())
            .push_bind(sale.occupation.label())
            .push_bind(actor.to_string());
    });

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected())
}

/// Remove live rows dated inside `window`, using the table's delete convention
pub async fn delete_window(pool: &SqlitePool, table: FactTable, window: DateWindow) -> Result<u64> {
    let start = format_canonical(window.start);
    let end = format_canonical(window.end);

    let result = match table.delete_mode() {
        DeleteMode::Soft => {
            sqlx::query(&format!(
                "UPDATE {} SET deleted_at = ? \
                 WHERE deleted_at IS NULL AND sale_date BETWEEN ? AND ?",
                table.table_name()
            ))
            .bind(Utc::now().to_rfc3339())
            .bind(start)
            .bind(end)
            .execute(pool)
            .await?
        }
        DeleteMode::Hard => {
            sqlx::query(&format!(
                "DELETE FROM {} WHERE deleted_at IS NULL AND sale_date BETWEEN ? AND ?",
                table.table_name()
            ))
            .bind(start)
            .bind(end)
            .execute(pool)
            .await?
        }
    };

    Ok(result.rows_affected())
}

/// Live rows dated inside `window`
pub async fn count_live_in_window(pool: &SqlitePool, table: FactTable, window: DateWindow) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL AND sale_date BETWEEN ? AND ?",
        table.table_name()
    ))
    .bind(format_canonical(window.start))
    .bind(format_canonical(window.end))
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Earliest and latest live sale date
pub async fn live_date_bounds(
    pool: &SqlitePool,
    table: FactTable,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
    let (min, max): (Option<String>, Option<String>) = sqlx::query_as(&format!(
        "SELECT MIN(sale_date), MAX(sale_date) FROM {} WHERE deleted_at IS NULL",
        table.table_name()
    ))
    .fetch_one(pool)
    .await?;

    Ok((parse_stored_date(min)?, parse_stored_date(max)?))
}

/// Live rows on the wrong side of `cutover` for this table
pub async fn count_seam_breaches(pool: &SqlitePool, table: FactTable, cutover: NaiveDate) -> Result<i64> {
    let predicate = match table {
        FactTable::Legacy => "sale_date >= ?",
        FactTable::Successor => "sale_date < ?",
    };
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL AND {}",
        table.table_name(),
        predicate
    ))
    .bind(format_canonical(cutover))
    .fetch_one(pool)
    .await?;
    Ok(count)
}

fn parse_stored_date(value: Option<String>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|e| Error::Internal(format!("Stored sale_date {:?} is not ISO: {}", s, e)))
        })
        .transpose()
}
