//! Evidence photo retention
//!
//! Photos older than the retention period are deleted from the asset
//! store and then from the index. An asset that is already gone counts
//! as deleted. A failed delete keeps the index row so the next run
//! retries it.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use promo_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use crate::db::photos;

/// Result of deleting one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
    Failed(String),
}

/// Binary asset store holding evidence photos
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn delete(&self, key: &str) -> DeleteOutcome;
}

/// Asset store backed by a directory tree
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path for `key`, refusing keys that would leave the root
    pub fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key.trim());
        if relative.as_os_str().is_empty() {
            return Err(Error::InvalidInput("Asset key is empty".to_string()));
        }
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(Error::InvalidInput(format!("Asset key escapes the store root: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn delete(&self, key: &str) -> DeleteOutcome {
        let path = match self.resolve(key) {
            Ok(p) => p,
            Err(e) => return DeleteOutcome::Failed(e.to_string()),
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => DeleteOutcome::Deleted,
            Err(e) if e.kind() == ErrorKind::NotFound => DeleteOutcome::AlreadyAbsent,
            Err(e) => DeleteOutcome::Failed(format!("{}: {}", path.display(), e)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    pub asset_key: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub scanned: usize,
    pub deleted: usize,
    pub already_absent: usize,
    pub failed: usize,
    pub failures: Vec<CleanupFailure>,
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Evidence cleanup")?;
        writeln!(f, "  scanned:         {}", self.scanned)?;
        writeln!(f, "  deleted:         {}", self.deleted)?;
        writeln!(f, "  already absent:  {}", self.already_absent)?;
        write!(f, "  failed:          {}", self.failed)?;
        for failure in &self.failures {
            write!(f, "\n  FAIL {}: {}", failure.asset_key, failure.message)?;
        }
        Ok(())
    }
}

impl CleanupReport {
    fn fail(&mut self, asset_key: &str, message: String) {
        warn!(asset_key = %asset_key, error = %message, "Evidence cleanup failed");
        self.failed += 1;
        self.failures.push(CleanupFailure {
            asset_key: asset_key.to_string(),
            message,
        });
    }
}

/// Delete evidence photos recorded more than `retention_days` before `now`
pub async fn run_cleanup(
    pool: &SqlitePool,
    store: &dyn AssetStore,
    retention_days: u32,
    now: DateTime<Utc>,
) -> Result<CleanupReport> {
    let cutoff = now - Duration::days(i64::from(retention_days));
    let expired = photos::photos_older_than(pool, cutoff).await?;

    let mut report = CleanupReport {
        scanned: expired.len(),
        ..Default::default()
    };
    info!(count = expired.len(), cutoff = %cutoff, "Cleaning up expired evidence photos");

    for photo in &expired {
        let outcome = store.delete(&photo.asset_key).await;
        debug!(asset_key = %photo.asset_key, ?outcome, "Asset delete");

        match outcome {
            DeleteOutcome::Failed(message) => {
                report.fail(&photo.asset_key, message);
                continue;
            }
            DeleteOutcome::Deleted => report.deleted += 1,
            DeleteOutcome::AlreadyAbsent => report.already_absent += 1,
        }

        if let Err(e) = photos::delete_photo_row(pool, &photo.id).await {
            report.fail(&photo.asset_key, format!("index row not removed: {}", e));
        }
    }

    Ok(report)
}
