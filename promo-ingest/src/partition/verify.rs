use chrono::NaiveDate;
use promo_common::db::{DateWindow, FactTable};
use promo_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::fmt;
use tracing::{error, info};

use crate::db::sales;

/// Invariant breach found after a run. Reported, never auto-corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Live rows in the non-target table inside the window
    ConflictingRows { table: FactTable, count: i64 },
    /// Target window count differs from what was inserted
    CountMismatch { table: FactTable, expected: i64, actual: i64 },
    /// Latest live legacy date is not before the earliest live successor date
    Overlap { legacy_max: NaiveDate, successor_min: NaiveDate },
    /// Live rows on the wrong side of the cutover
    SeamBreach { table: FactTable, count: i64 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::ConflictingRows { table, count } => {
                write!(f, "{} live row(s) in {} inside the window", count, table)
            }
            Violation::CountMismatch { table, expected, actual } => {
                write!(f, "{} holds {} row(s) in the window, expected {}", table, actual, expected)
            }
            Violation::Overlap { legacy_max, successor_min } => write!(
                f,
                "legacy max {} is not before successor min {}",
                legacy_max, successor_min
            ),
            Violation::SeamBreach { table, count } => {
                write!(f, "{} live row(s) in {} on the wrong side of the cutover", count, table)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub window: DateWindow,
    pub target: FactTable,
    pub target_count: i64,
    pub conflicting_count: i64,
    pub legacy_max: Option<NaiveDate>,
    pub successor_min: Option<NaiveDate>,
    pub violations: Vec<Violation>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
        writeln!(f, "Verification {} ({})", self.window, self.target)?;
        writeln!(f, "  {} rows in window:  {}", self.target, self.target_count)?;
        writeln!(f, "  {} rows in window:  {}", self.target.other(), self.conflicting_count)?;
        writeln!(f, "  legacy max date:      {}", show(self.legacy_max))?;
        write!(f, "  successor min date:   {}", show(self.successor_min))?;
        if self.is_clean() {
            write!(f, "\n  OK")?;
        }
        for v in &self.violations {
            write!(f, "\n  VIOLATION: {}", v)?;
        }
        Ok(())
    }
}

/// Check the partition invariants for `window`
///
/// With `expected` unset the target count is taken as-is (standalone
/// verification).
pub async fn verify_window(
    pool: &SqlitePool,
    window: DateWindow,
    target: FactTable,
    cutover: NaiveDate,
    expected: Option<i64>,
) -> Result<VerificationReport> {
    let conflicting = target.other();
    let target_count = sales::count_live_in_window(pool, target, window).await?;
    let conflicting_count = sales::count_live_in_window(pool, conflicting, window).await?;
    let (_, legacy_max) = sales::live_date_bounds(pool, FactTable::Legacy).await?;
    let (successor_min, _) = sales::live_date_bounds(pool, FactTable::Successor).await?;

    let mut violations = Vec::new();
    if conflicting_count > 0 {
        violations.push(Violation::ConflictingRows {
            table: conflicting,
            count: conflicting_count,
        });
    }
    if let Some(expected) = expected {
        if expected != target_count {
            violations.push(Violation::CountMismatch {
                table: target,
                expected,
                actual: target_count,
            });
        }
    }
    if let (Some(legacy_max), Some(successor_min)) = (legacy_max, successor_min) {
        if legacy_max >= successor_min {
            violations.push(Violation::Overlap {
                legacy_max,
                successor_min,
            });
        }
    }
    for table in [FactTable::Legacy, FactTable::Successor] {
        let count = sales::count_seam_breaches(pool, table, cutover).await?;
        if count > 0 {
            violations.push(Violation::SeamBreach { table, count });
        }
    }

    for v in &violations {
        error!(window = %window, target = %target, "Partition violation: {}", v);
    }
    if violations.is_empty() {
        info!(window = %window, target = %target, count = target_count, "Partition verified");
    }

    Ok(VerificationReport {
        window,
        target,
        target_count,
        conflicting_count,
        legacy_max,
        successor_min,
        violations,
    })
}
