//! Area hierarchy aggregate: delete-all then re-insert

use promo_common::db::{Area, Role};
use promo_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::{accounts, promoters};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaHierarchyEntry {
    pub area: Area,
    pub sator: String,
    pub manager_name: Option<String>,
    pub manager_account_id: Option<String>,
    pub sator_account_id: Option<String>,
    pub promoter_count: i64,
}

/// Recompute every (area, sator) entry from current promoter rows and
/// replace the table contents
///
/// Converges to the same state for the same promoter data, however many
/// times it runs.
pub async fn rebuild_area_hierarchy(pool: &SqlitePool) -> Result<Vec<AreaHierarchyEntry>> {
    let counts = promoters::count_by_area_and_sator(pool).await?;

    let mut entries = Vec::with_capacity(counts.len());
    for (area_code, sator, promoter_count) in counts {
        let area: Area = area_code.parse()?;
        let manager = accounts::find_by_role_and_area(pool, Role::AreaManager, area).await?;
        let lead = accounts::find_sator_lead(pool, &sator).await?;
        entries.push(AreaHierarchyEntry {
            area,
            sator,
            manager_name: manager.as_ref().map(|m| m.name.clone()),
            manager_account_id: manager.map(|m| m.id),
            sator_account_id: lead.map(|l| l.id),
            promoter_count,
        });
    }

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM area_hierarchy").execute(&mut *tx).await?;
    for entry in &entries {
        sqlx::query(
            r#"
            INSERT INTO area_hierarchy
                (area, sator, manager_name, manager_account_id, sator_account_id, promoter_count)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.area.code())
        .bind(&entry.sator)
        .bind(&entry.manager_name)
        .bind(&entry.manager_account_id)
        .bind(&entry.sator_account_id)
        .bind(entry.promoter_count)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(entries = entries.len(), "Area hierarchy rebuilt");
    Ok(entries)
}
