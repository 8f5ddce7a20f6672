//! Integration tests for promo-janitor API endpoints
//!
//! - Health endpoint (no auth required)
//! - Cleanup trigger authentication via `x-cleanup-secret`
//! - Cleanup trigger runs a pass and returns the report

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use promo_common::db::init::init_database;
use promo_ingest::cleanup::FsAssetStore;
use promo_ingest::db::photos::insert_photo;
use promo_janitor::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const SECRET: &str = "jadwal-harian";

async fn setup_test_db(dir: &TempDir) -> SqlitePool {
    init_database(&dir.path().join("promo.db")).await.unwrap()
}

fn setup_app(db: SqlitePool, asset_root: &std::path::Path, secret: Option<&str>) -> axum::Router {
    let state = AppState::new(
        db,
        Arc::new(FsAssetStore::new(asset_root)),
        90,
        secret.map(str::to_string),
    );
    build_router(state)
}

fn cleanup_request(secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/api/cleanup");
    if let Some(secret) = secret {
        builder = builder.header("x-cleanup-secret", secret);
    }
    builder.body(Body::empty()).unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(setup_test_db(&dir).await, dir.path(), Some(SECRET));

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "promo-janitor");
    assert!(body["version"].is_string());
    assert_eq!(body["database"], true);
    assert_eq!(body["accepts_triggers"], true);
}

#[tokio::test]
async fn test_health_shows_triggers_refused_without_secret() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(setup_test_db(&dir).await, dir.path(), None);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["accepts_triggers"], false);
}

#[tokio::test]
async fn test_missing_secret_header_rejected() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(setup_test_db(&dir).await, dir.path(), Some(SECRET));

    let response = app.oneshot(cleanup_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("x-cleanup-secret"));
}

#[tokio::test]
async fn test_wrong_secret_rejected() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(setup_test_db(&dir).await, dir.path(), Some(SECRET));

    let response = app.oneshot(cleanup_request(Some("tebakan"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unconfigured_secret_disables_trigger() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(setup_test_db(&dir).await, dir.path(), None);

    let response = app.oneshot(cleanup_request(Some(""))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("disabled"));
}

#[tokio::test]
async fn test_cleanup_runs_and_records_run() {
    let dir = TempDir::new().unwrap();
    let db = setup_test_db(&dir).await;
    let assets = dir.path().join("evidence");
    std::fs::create_dir_all(&assets).unwrap();
    std::fs::write(assets.join("old.jpg"), b"jpeg").unwrap();

    let now = Utc::now();
    insert_photo(&db, None, "old.jpg", now - Duration::days(91)).await.unwrap();
    insert_photo(&db, None, "missing.jpg", now - Duration::days(95)).await.unwrap();
    insert_photo(&db, None, "fresh.jpg", now - Duration::days(1)).await.unwrap();

    let app = setup_app(db.clone(), &assets, Some(SECRET));
    let response = app.oneshot(cleanup_request(Some(SECRET))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["scanned"], 2);
    assert_eq!(body["deleted"], 1);
    assert_eq!(body["already_absent"], 1);
    assert_eq!(body["failed"], 0);
    assert!(!assets.join("old.jpg").exists());

    let runs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM import_runs WHERE command = 'cleanup'")
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(runs, 1);
}
