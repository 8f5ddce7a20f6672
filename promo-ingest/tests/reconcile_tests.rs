//! Integration tests for the partition enforcer
//!
//! - Re-running a window converges to the same row count
//! - Conflicting rows in the other fact table are removed
//! - Windows crossing the cutover are refused before any write
//! - A failing chunk stops the batch and is reported
//! - Verification flags overlapping tables and count drift

use chrono::NaiveDate;
use promo_common::config::EngineConfig;
use promo_common::db::init::init_database;
use promo_common::db::{DateWindow, FactTable, SaleStatus};
use promo_common::Error;
use promo_ingest::commands::reconcile_rows;
use promo_ingest::db::sales::{count_live_in_window, insert_sales};
use promo_ingest::extract::SaleDraft;
use promo_ingest::normalize::Occupation;
use promo_ingest::partition::{verify_window, Violation};
use promo_ingest::spreadsheet::{CellValue, SpreadsheetRow};
use sqlx::SqlitePool;
use tempfile::TempDir;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn cutover() -> NaiveDate {
    d(2025, 9, 1)
}

fn september() -> DateWindow {
    DateWindow::new(d(2025, 9, 1), d(2025, 9, 30)).unwrap()
}

fn test_config(batch_size: usize) -> EngineConfig {
    EngineConfig {
        cutover_date: Some(cutover()),
        batch_size,
        ..Default::default()
    }
}

async fn setup_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("promo.db")).await.unwrap();
    (dir, pool)
}

fn sale_row(date: CellValue, promoter: &str, store: &str, status: &str) -> SpreadsheetRow {
    SpreadsheetRow::new()
        .with("Tanggal", date)
        .with("Nama Promotor", CellValue::Text(promoter.to_string()))
        .with("ID Toko", CellValue::Text(store.to_string()))
        .with("Status", CellValue::Text(status.to_string()))
        .with("Tipe HP", CellValue::Text("Galaxy A15".to_string()))
        .with("Nama Konsumen", CellValue::Text("Maria".to_string()))
        .with("Pekerjaan", CellValue::Text("guru PNS".to_string()))
}

fn september_rows() -> Vec<SpreadsheetRow> {
    vec![
        sale_row(CellValue::Text("10-09-2025".into()), "Andi", "T01", "ACC"),
        sale_row(CellValue::Number(45900.0), "Budi", "T02", "pending"),
        sale_row(CellValue::Date(d(2025, 9, 15)), "Citra", "T01", "Dapat Limit Tapi Belum Ambil HP"),
        sale_row(CellValue::Text("12-09-2025".into()), "Dewi", "", "ACC"),
        // Outside the window
        sale_row(CellValue::Text("01-10-2025".into()), "Eka", "T03", "ACC"),
    ]
}

fn draft(date: NaiveDate, promoter: &str) -> SaleDraft {
    SaleDraft {
        sale_date: date,
        status: SaleStatus::Acc,
        status_raw: Some("acc".to_string()),
        promoter_name: promoter.to_string(),
        store_id: "T01".to_string(),
        phone_type: None,
        customer_name: None,
        occupation: Occupation::Unemployed,
    }
}

#[tokio::test]
async fn test_reconcile_writes_window_and_verifies() {
    let (_dir, pool) = setup_db().await;
    let config = test_config(500);

    let summary = reconcile_rows(&pool, &config, &september_rows(), september(), FactTable::Successor, "migration")
        .await
        .unwrap();

    assert_eq!(summary.extraction.kept, 3);
    assert_eq!(summary.extraction.blank_store, 1);
    assert_eq!(summary.extraction.outside_window, 1);
    assert_eq!(summary.report.batch.written, 3);
    assert!(summary.report.verification.is_clean(), "{}", summary.report.verification);
    assert!(summary.is_clean());

    let pending: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE status = 'pending'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(pending, 2);

    let actor: String = sqlx::query_scalar("SELECT DISTINCT created_by FROM sales")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(actor, "migration");
}

#[tokio::test]
async fn test_reconcile_twice_is_idempotent() {
    let (_dir, pool) = setup_db().await;
    let config = test_config(2);
    let rows = september_rows();

    let first = reconcile_rows(&pool, &config, &rows, september(), FactTable::Successor, "migration")
        .await
        .unwrap();
    let second = reconcile_rows(&pool, &config, &rows, september(), FactTable::Successor, "migration")
        .await
        .unwrap();

    assert_eq!(first.report.target_removed, 0);
    assert_eq!(second.report.target_removed, 3);
    assert_eq!(
        count_live_in_window(&pool, FactTable::Successor, september()).await.unwrap(),
        3
    );
    assert!(second.report.verification.is_clean());
}

#[tokio::test]
async fn test_conflicting_legacy_rows_soft_deleted() {
    let (_dir, pool) = setup_db().await;
    let config = test_config(500);

    // Rows on the wrong side of the seam, left behind by the old system
    insert_sales(
        &pool,
        FactTable::Legacy,
        &[draft(d(2025, 8, 20), "Lama"), draft(d(2025, 9, 3), "Salah"), draft(d(2025, 9, 4), "Salah")],
        "legacy-app",
    )
    .await
    .unwrap();

    let before = verify_window(&pool, september(), FactTable::Successor, cutover(), None)
        .await
        .unwrap();
    assert!(before
        .violations
        .iter()
        .any(|v| matches!(v, Violation::ConflictingRows { count: 2, .. })));
    assert!(before
        .violations
        .iter()
        .any(|v| matches!(v, Violation::SeamBreach { table: FactTable::Legacy, count: 2 })));

    let summary = reconcile_rows(&pool, &config, &september_rows(), september(), FactTable::Successor, "migration")
        .await
        .unwrap();
    assert_eq!(summary.report.conflicting_removed, 2);
    assert!(summary.report.verification.is_clean(), "{}", summary.report.verification);
    assert_eq!(summary.report.verification.legacy_max, Some(d(2025, 8, 20)));
    assert_eq!(summary.report.verification.successor_min, Some(d(2025, 9, 1)));

    // Soft delete keeps the rows
    let soft_deleted: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM legacy_sales WHERE deleted_at IS NOT NULL")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(soft_deleted, 2);
}

#[tokio::test]
async fn test_successor_rows_hard_deleted_for_legacy_window() {
    let (_dir, pool) = setup_db().await;
    let config = test_config(500);
    let august = DateWindow::new(d(2025, 8, 1), d(2025, 8, 31)).unwrap();

    insert_sales(&pool, FactTable::Successor, &[draft(d(2025, 8, 30), "Salah")], "new-app")
        .await
        .unwrap();

    let rows = vec![sale_row(CellValue::Text("15-08-2025".into()), "Andi", "T01", "reject")];
    let summary = reconcile_rows(&pool, &config, &rows, august, FactTable::Legacy, "migration")
        .await
        .unwrap();

    assert_eq!(summary.report.conflicting_removed, 1);
    assert!(summary.report.verification.is_clean());

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_window_crossing_cutover_refused() {
    let (_dir, pool) = setup_db().await;
    let config = test_config(500);
    let window = DateWindow::new(d(2025, 8, 25), d(2025, 9, 5)).unwrap();

    insert_sales(&pool, FactTable::Legacy, &[draft(d(2025, 8, 26), "Andi")], "legacy-app")
        .await
        .unwrap();

    let result = reconcile_rows(&pool, &config, &september_rows(), window, FactTable::Successor, "migration").await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    // Nothing touched
    let live: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM legacy_sales WHERE deleted_at IS NULL")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(live, 1);
}

#[tokio::test]
async fn test_missing_cutover_is_config_error() {
    let (_dir, pool) = setup_db().await;
    let config = EngineConfig::default();

    let result = reconcile_rows(&pool, &config, &september_rows(), september(), FactTable::Successor, "migration").await;
    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn test_failing_chunk_stops_batch() {
    let (_dir, pool) = setup_db().await;
    let config = test_config(2);

    sqlx::query(
        r#"
        CREATE TRIGGER reject_gagal BEFORE INSERT ON sales
        WHEN NEW.promoter_name = 'Gagal'
        BEGIN
            SELECT RAISE(ABORT, 'injected store failure');
        END
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let rows = vec![
        sale_row(CellValue::Text("02-09-2025".into()), "Andi", "T01", "acc"),
        sale_row(CellValue::Text("03-09-2025".into()), "Budi", "T01", "acc"),
        sale_row(CellValue::Text("04-09-2025".into()), "Gagal", "T01", "acc"),
        sale_row(CellValue::Text("05-09-2025".into()), "Citra", "T01", "acc"),
        sale_row(CellValue::Text("06-09-2025".into()), "Dewi", "T01", "acc"),
    ];

    let summary = reconcile_rows(&pool, &config, &rows, september(), FactTable::Successor, "migration")
        .await
        .unwrap();

    let batch = &summary.report.batch;
    assert_eq!(batch.total_records, 5);
    assert_eq!(batch.written, 2);
    assert_eq!(batch.chunks_written, 1);
    assert_eq!(batch.last_successful_chunk, Some(0));
    let failure = batch.failure.as_ref().expect("chunk failure reported");
    assert_eq!(failure.chunk_index, 1);
    assert!(failure.message.contains("injected store failure"));
    assert!(!summary.is_clean());

    // What did land is what the report says landed
    assert_eq!(summary.report.verification.target_count, 2);
}

#[tokio::test]
async fn test_verify_reports_overlap_between_tables() {
    let (_dir, pool) = setup_db().await;

    insert_sales(&pool, FactTable::Legacy, &[draft(d(2025, 9, 10), "Andi")], "legacy-app")
        .await
        .unwrap();
    insert_sales(&pool, FactTable::Successor, &[draft(d(2025, 9, 5), "Budi")], "new-app")
        .await
        .unwrap();

    let report = verify_window(&pool, september(), FactTable::Successor, cutover(), None)
        .await
        .unwrap();

    assert!(!report.is_clean());
    assert_eq!(report.legacy_max, Some(d(2025, 9, 10)));
    assert_eq!(report.successor_min, Some(d(2025, 9, 5)));
    assert!(report.violations.contains(&Violation::Overlap {
        legacy_max: d(2025, 9, 10),
        successor_min: d(2025, 9, 5),
    }));
}

#[tokio::test]
async fn test_verify_reports_count_mismatch() {
    let (_dir, pool) = setup_db().await;

    insert_sales(
        &pool,
        FactTable::Successor,
        &[draft(d(2025, 9, 2), "Andi"), draft(d(2025, 9, 3), "Budi")],
        "new-app",
    )
    .await
    .unwrap();

    let matching = verify_window(&pool, september(), FactTable::Successor, cutover(), Some(2))
        .await
        .unwrap();
    assert!(matching.is_clean(), "{}", matching);

    let report = verify_window(&pool, september(), FactTable::Successor, cutover(), Some(3))
        .await
        .unwrap();
    assert_eq!(
        report.violations,
        vec![Violation::CountMismatch {
            table: FactTable::Successor,
            expected: 3,
            actual: 2,
        }]
    );
    assert!(report.to_string().contains("expected 3"));
}
