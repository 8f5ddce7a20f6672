//! Store sheet extraction

use serde::Serialize;
use std::fmt;
use tracing::debug;

use super::{dedupe_by_key, Extraction};
use crate::spreadsheet::SpreadsheetRow;

pub const COL_STORE_ID: &str = "ID Toko";
pub const COL_STORE_NAME: &str = "Nama Toko";
pub const COL_AREA: &str = "Area";
pub const STORE_HEADERS: [&str; 3] = [COL_STORE_ID, COL_STORE_NAME, COL_AREA];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDraft {
    pub store_id: String,
    pub name: String,
    pub area_label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub rows_read: usize,
    pub kept: usize,
    pub blank_id: usize,
    pub blank_name: usize,
    pub duplicates: usize,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stores: {} rows, {} kept, {} blank id, {} blank name, {} duplicates",
            self.rows_read, self.kept, self.blank_id, self.blank_name, self.duplicates
        )
    }
}

/// Stores deduplicate on `store_id`, first occurrence wins
pub fn extract_stores(rows: &[SpreadsheetRow]) -> Extraction<StoreDraft, StoreStats> {
    let mut stats = StoreStats {
        rows_read: rows.len(),
        ..StoreStats::default()
    };

    let mut candidates = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(store_id) = row.text(COL_STORE_ID) else {
            stats.blank_id += 1;
            continue;
        };
        let Some(name) = row.text(COL_STORE_NAME) else {
            stats.blank_name += 1;
            continue;
        };
        candidates.push(StoreDraft {
            store_id,
            name,
            area_label: row.text(COL_AREA),
        });
    }

    let (records, duplicates) = dedupe_by_key(candidates, |s| s.store_id.clone());
    stats.duplicates = duplicates;
    stats.kept = records.len();

    debug!(%stats, "Extracted stores");
    Extraction { records, stats }
}
