use chrono::NaiveDate;
use promo_common::db::{DateWindow, FactTable};
use promo_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::fmt;
use tracing::{info, warn};

use super::verify::{verify_window, VerificationReport};
use crate::batch::{write_in_chunks, BatchOutcome};
use crate::db::sales;
use crate::extract::SaleDraft;

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub window: DateWindow,
    pub target: FactTable,
    /// Live rows removed from the other fact table
    pub conflicting_removed: u64,
    /// Pre-existing live rows removed from the target table
    pub target_removed: u64,
    pub batch: BatchOutcome,
    pub verification: VerificationReport,
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reconcile {} -> {}", self.window, self.target)?;
        writeln!(
            f,
            "  removed from {}: {}",
            self.target.other(),
            self.conflicting_removed
        )?;
        writeln!(f, "  removed from {}: {}", self.target, self.target_removed)?;
        writeln!(f, "  insert: {}", self.batch)?;
        write!(f, "{}", self.verification)
    }
}

/// Make `target` the sole owner of `window`, filled from `records`
///
/// Refuses a window on the wrong side of `cutover`, and any record dated
/// outside the window, before writing anything. Deletion failures are
/// returned as `Err`; an insert failure stops the batch and shows up in
/// the report together with the verification result.
pub async fn reconcile_window(
    pool: &SqlitePool,
    window: DateWindow,
    target: FactTable,
    cutover: NaiveDate,
    records: &[SaleDraft],
    actor: &str,
    batch_size: usize,
) -> Result<ReconcileReport> {
    if !window.fits(target, cutover) {
        return Err(Error::InvalidInput(format!(
            "Window {} crosses the cutover {} for {}",
            window, cutover, target
        )));
    }
    if let Some(stray) = records.iter().find(|r| !window.contains(r.sale_date)) {
        return Err(Error::InvalidInput(format!(
            "Record dated {} lies outside window {}",
            stray.sale_date, window
        )));
    }
    if actor.trim().is_empty() {
        return Err(Error::InvalidInput("Actor must not be blank".to_string()));
    }

    let conflicting = target.other();
    let conflicting_removed = sales::delete_window(pool, conflicting, window).await?;
    info!(table = %conflicting, window = %window, removed = conflicting_removed, "Cleared conflicting rows");

    let target_removed = sales::delete_window(pool, target, window).await?;
    info!(table = %target, window = %window, removed = target_removed, "Cleared target window");

    let batch = write_in_chunks(records, batch_size, |chunk| {
        sales::insert_sales(pool, target, chunk, actor)
    })
    .await;
    if !batch.is_complete() {
        warn!(table = %target, "{}", batch);
    }

    let verification = verify_window(pool, window, target, cutover, Some(batch.written as i64)).await?;

    Ok(ReconcileReport {
        window,
        target,
        conflicting_removed,
        target_removed,
        batch,
        verification,
    })
}
