//! Store upserts keyed by `store_id`

use promo_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::extract::StoreDraft;

/// Insert or refresh one chunk of stores
pub async fn upsert_stores(pool: &SqlitePool, chunk: &[StoreDraft]) -> Result<u64> {
    if chunk.is_empty() {
        return Ok(0);
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT INTO stores (store_id, name, area_label) ");
    qb.push_values(chunk, |mut b, store| {
        b.push_bind(store.store_id.clone())
            .push_bind(store.name.clone())
            .push_bind(store.area_label.clone());
    });
    qb.push(
        " ON CONFLICT(store_id) DO UPDATE SET \
         name = excluded.name, \
         area_label = excluded.area_label, \
         updated_at = CURRENT_TIMESTAMP",
    );

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected())
}
