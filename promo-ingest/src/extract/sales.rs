//! Sales history extraction
//!
//! Check order per row: date, promoter, store, window. A row is counted
//! under the first check it fails.

use chrono::NaiveDate;
use promo_common::db::{DateWindow, SaleStatus};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use super::Extraction;
use crate::normalize::{classify_occupation, classify_status, normalize_date, Occupation, StatusClass};
use crate::spreadsheet::SpreadsheetRow;

pub const COL_DATE: &str = "Tanggal";
pub const COL_PROMOTER_NAME: &str = "Nama Promotor";
pub const COL_STORE_ID: &str = "ID Toko";
pub const COL_STATUS: &str = "Status";
pub const COL_PHONE_TYPE: &str = "Tipe HP";
pub const COL_CUSTOMER: &str = "Nama Konsumen";
pub const COL_OCCUPATION: &str = "Pekerjaan";
pub const SALE_HEADERS: [&str; 7] = [
    COL_DATE,
    COL_PROMOTER_NAME,
    COL_STORE_ID,
    COL_STATUS,
    COL_PHONE_TYPE,
    COL_CUSTOMER,
    COL_OCCUPATION,
];

/// A normalized sale ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleDraft {
    pub sale_date: NaiveDate,
    pub status: SaleStatus,
    pub status_raw: Option<String>,
    pub promoter_name: String,
    pub store_id: String,
    pub phone_type: Option<String>,
    pub customer_name: Option<String>,
    pub occupation: Occupation,
}

/// Discard tallies, one counter per reason
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaleStats {
    pub rows_read: usize,
    pub kept: usize,
    pub bad_date: usize,
    pub blank_promoter: usize,
    pub blank_store: usize,
    pub outside_window: usize,
    /// Kept rows whose status text matched no rule (stored as reject)
    pub unrecognized_status: usize,
}

impl SaleStats {
    pub fn dropped(&self) -> usize {
        self.bad_date + self.blank_promoter + self.blank_store + self.outside_window
    }
}

impl fmt::Display for SaleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sales: {} rows read, {} kept, {} dropped", self.rows_read, self.kept, self.dropped())?;
        writeln!(f, "  bad date:            {}", self.bad_date)?;
        writeln!(f, "  blank promoter:      {}", self.blank_promoter)?;
        writeln!(f, "  blank store:         {}", self.blank_store)?;
        writeln!(f, "  outside window:      {}", self.outside_window)?;
        write!(f, "  unrecognized status: {} (stored as reject)", self.unrecognized_status)
    }
}

/// Normalize sale rows and keep those dated inside `window`
pub fn extract_sales(rows: &[SpreadsheetRow], window: DateWindow) -> Extraction<SaleDraft, SaleStats> {
    let mut stats = SaleStats {
        rows_read: rows.len(),
        ..SaleStats::default()
    };
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let sale_date = match normalize_date(row.get(COL_DATE)) {
            Ok(date) => date,
            Err(e) => {
                debug!(row = index + 2, error = %e, "Dropping sale row: bad date");
                stats.bad_date += 1;
                continue;
            }
        };

        let Some(promoter_name) = row.text(COL_PROMOTER_NAME) else {
            stats.blank_promoter += 1;
            continue;
        };

        let Some(store_id) = row.text(COL_STORE_ID) else {
            stats.blank_store += 1;
            continue;
        };

        if !window.contains(sale_date) {
            stats.outside_window += 1;
            continue;
        }

        let status_raw = row.text(COL_STATUS);
        let class = classify_status(status_raw.as_deref().unwrap_or(""));
        if let StatusClass::Unrecognized(text) = &class {
            warn!(row = index + 2, status = %text, "Unrecognized sale status, storing as reject");
            stats.unrecognized_status += 1;
        }

        records.push(SaleDraft {
            sale_date,
            status: class.terminal(),
            status_raw,
            promoter_name,
            store_id,
            phone_type: row.text(COL_PHONE_TYPE),
            customer_name: row.text(COL_CUSTOMER),
            occupation: classify_occupation(row.text(COL_OCCUPATION).as_deref()),
        });
    }

    stats.kept = records.len();
    if stats.dropped() > 0 {
        warn!(
            dropped = stats.dropped(),
            bad_date = stats.bad_date,
            blank_promoter = stats.blank_promoter,
            blank_store = stats.blank_store,
            outside_window = stats.outside_window,
            "Sale rows dropped during extraction"
        );
    }

    Extraction { records, stats }
}
