//! One orchestrator per CLI subcommand
//!
//! Each returns a summary that prints as a human-readable report and
//! serializes into the run log. Mutating commands record an `import_runs`
//! row; a run log failure is only a warning.

use chrono::{DateTime, Utc};
use promo_common::config::EngineConfig;
use promo_common::db::{DateWindow, FactTable};
use promo_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use crate::batch::{write_in_chunks, BatchOutcome};
use crate::cleanup::{run_cleanup, CleanupReport, FsAssetStore};
use crate::credentials::{provision, CredentialFile, ProvisionOutcome};
use crate::db::{promoters, runs, stores};
use crate::extract::{
    extract_promoters, extract_sales, extract_stores, PromoterStats, SaleStats, StoreStats,
    PROMOTER_HEADERS, SALE_HEADERS, STORE_HEADERS,
};
use crate::hierarchy::{assign_hierarchy, rebuild_area_hierarchy, AreaHierarchyEntry, AssignmentReport};
use crate::partition::{reconcile_window, verify_window, ReconcileReport, VerificationReport};
use crate::spreadsheet::{SourceWorkbook, SpreadsheetRow};

async fn log_run<S: Serialize>(
    pool: &SqlitePool,
    command: &str,
    source_sha256: Option<&str>,
    summary: &S,
    started_at: DateTime<Utc>,
) {
    match runs::record_run(pool, command, source_sha256, summary, started_at).await {
        Ok(id) => info!(command, run_id = %id, "Run recorded"),
        Err(e) => warn!(command, error = %e, "Failed to record run log"),
    }
}

// ---------------------------------------------------------------------------
// import-master
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MasterImportSummary {
    pub stores: StoreStats,
    pub store_batch: BatchOutcome,
    pub promoters: PromoterStats,
    pub promoter_batch: BatchOutcome,
}

impl fmt::Display for MasterImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Master data import")?;
        writeln!(f, "  stores:    {}", self.stores)?;
        writeln!(f, "             {}", self.store_batch)?;
        writeln!(f, "  promoters: {}", self.promoters)?;
        write!(f, "             {}", self.promoter_batch)
    }
}

/// Extract and upsert stores, then promoters
///
/// Promoters are skipped when the store batch stopped early, since their
/// store references would point at missing rows.
pub async fn import_master_rows(
    pool: &SqlitePool,
    batch_size: usize,
    store_rows: &[SpreadsheetRow],
    promoter_rows: &[SpreadsheetRow],
) -> MasterImportSummary {
    let store_extract = extract_stores(store_rows);
    let store_batch = write_in_chunks(&store_extract.records, batch_size, |chunk| {
        stores::upsert_stores(pool, chunk)
    })
    .await;

    let promoter_extract = extract_promoters(promoter_rows);
    let promoter_batch = if store_batch.is_complete() {
        write_in_chunks(&promoter_extract.records, batch_size, |chunk| {
            promoters::upsert_promoters(pool, chunk)
        })
        .await
    } else {
        warn!("Store import incomplete, promoters not written");
        BatchOutcome {
            total_records: promoter_extract.records.len(),
            chunk_size: batch_size.max(1),
            ..Default::default()
        }
    };

    MasterImportSummary {
        stores: store_extract.stats,
        store_batch,
        promoters: promoter_extract.stats,
        promoter_batch,
    }
}

pub async fn import_master(pool: &SqlitePool, config: &EngineConfig, file: &Path) -> Result<MasterImportSummary> {
    let started_at = Utc::now();
    let mut workbook = SourceWorkbook::open(file)?;
    let store_rows = workbook.sheet_rows(&config.sheets.stores, &STORE_HEADERS)?;
    let promoter_rows = workbook.sheet_rows(&config.sheets.promoters, &PROMOTER_HEADERS)?;

    let summary = import_master_rows(pool, config.batch_size, &store_rows, &promoter_rows).await;
    log_run(pool, "import-master", Some(workbook.sha256()), &summary, started_at).await;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileSummary {
    pub extraction: SaleStats,
    pub report: ReconcileReport,
}

impl ReconcileSummary {
    pub fn is_clean(&self) -> bool {
        self.report.batch.is_complete() && self.report.verification.is_clean()
    }
}

impl fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.extraction)?;
        write!(f, "{}", self.report)
    }
}

/// Extract sales for `window` and replay them into `target`
pub async fn reconcile_rows(
    pool: &SqlitePool,
    config: &EngineConfig,
    rows: &[SpreadsheetRow],
    window: DateWindow,
    target: FactTable,
    actor: &str,
) -> Result<ReconcileSummary> {
    let cutover = config.require_cutover()?;
    let extraction = extract_sales(rows, window);
    let report = reconcile_window(
        pool,
        window,
        target,
        cutover,
        &extraction.records,
        actor,
        config.batch_size,
    )
    .await?;

    Ok(ReconcileSummary {
        extraction: extraction.stats,
        report,
    })
}

pub async fn reconcile(
    pool: &SqlitePool,
    config: &EngineConfig,
    file: &Path,
    window: DateWindow,
    target: FactTable,
    actor: &str,
) -> Result<ReconcileSummary> {
    let started_at = Utc::now();
    // Fail on a bad window before reading a large workbook
    let cutover = config.require_cutover()?;
    if !window.fits(target, cutover) {
        return Err(promo_common::Error::InvalidInput(format!(
            "Window {} crosses the cutover {} for {}",
            window, cutover, target
        )));
    }

    let mut workbook = SourceWorkbook::open(file)?;
    let rows = workbook.concat_sheet_rows(&config.sheets.sales, &SALE_HEADERS)?;

    let summary = reconcile_rows(pool, config, &rows, window, target, actor).await?;
    log_run(pool, "reconcile", Some(workbook.sha256()), &summary, started_at).await;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// assign-hierarchy / rebuild-hierarchy
// ---------------------------------------------------------------------------

pub async fn assign(pool: &SqlitePool, config: &EngineConfig) -> Result<AssignmentReport> {
    let started_at = Utc::now();
    let report = assign_hierarchy(pool, config).await?;
    log_run(pool, "assign-hierarchy", None, &report, started_at).await;
    Ok(report)
}

#[derive(Debug, Clone, Serialize)]
pub struct RebuildSummary {
    pub entries: Vec<AreaHierarchyEntry>,
}

impl fmt::Display for RebuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Area hierarchy: {} entr(ies)", self.entries.len())?;
        for e in &self.entries {
            write!(
                f,
                "\n  {:<10} {:<20} {:>4}  manager: {}",
                e.area.code(),
                e.sator,
                e.promoter_count,
                e.manager_name.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }
}

pub async fn rebuild(pool: &SqlitePool) -> Result<RebuildSummary> {
    let started_at = Utc::now();
    let summary = RebuildSummary {
        entries: rebuild_area_hierarchy(pool).await?,
    };
    log_run(pool, "rebuild-hierarchy", None, &summary, started_at).await;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// provision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ProvisionSummary {
    pub outcomes: Vec<ProvisionOutcome>,
}

impl ProvisionSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }
}

impl fmt::Display for ProvisionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Provisioned {} of {} identities",
            self.succeeded(),
            self.outcomes.len()
        )?;
        for o in &self.outcomes {
            write!(f, "\n  {}", o)?;
        }
        Ok(())
    }
}

pub async fn provision_file(pool: &SqlitePool, config: &EngineConfig, file: &Path) -> Result<ProvisionSummary> {
    let started_at = Utc::now();
    let credentials = CredentialFile::from_path(file)?;
    let summary = ProvisionSummary {
        outcomes: provision(pool, &credentials.identities, config.bcrypt_cost).await,
    };
    log_run(pool, "provision", None, &summary, started_at).await;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// verify / cleanup
// ---------------------------------------------------------------------------

/// Verification without writing; the live target count is the expectation
pub async fn verify(
    pool: &SqlitePool,
    config: &EngineConfig,
    window: DateWindow,
    target: FactTable,
) -> Result<VerificationReport> {
    let cutover = config.require_cutover()?;
    verify_window(pool, window, target, cutover, None).await
}

pub async fn cleanup(pool: &SqlitePool, config: &EngineConfig, now: DateTime<Utc>) -> Result<CleanupReport> {
    let store = FsAssetStore::new(config.cleanup.require_asset_root()?);
    let report = run_cleanup(pool, &store, config.cleanup.retention_days(), now).await?;
    log_run(pool, "cleanup", None, &report, now).await;
    Ok(report)
}
