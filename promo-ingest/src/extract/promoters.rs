//! Promoter (field agent) sheet extraction

use serde::Serialize;
use std::fmt;
use tracing::debug;

use super::{dedupe_by_key, name_key, Extraction};
use crate::spreadsheet::SpreadsheetRow;

pub const COL_PROMOTER_NAME: &str = "Nama Promotor";
pub const COL_SATOR: &str = "Sator";
pub const COL_TARGET: &str = "Target";
pub const COL_STORE_ID: &str = "ID Toko";
pub const COL_STATUS: &str = "Status";
pub const PROMOTER_HEADERS: [&str; 5] =
    [COL_PROMOTER_NAME, COL_SATOR, COL_TARGET, COL_STORE_ID, COL_STATUS];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoterDraft {
    pub name: String,
    pub sator: Option<String>,
    pub target: i64,
    pub store_id: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PromoterStats {
    pub rows_read: usize,
    pub kept: usize,
    pub blank_name: usize,
    pub duplicates: usize,
    /// Kept, but with no store reference
    pub without_store: usize,
}

impl fmt::Display for PromoterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "promoters: {} rows, {} kept, {} blank name, {} duplicates, {} without store",
            self.rows_read, self.kept, self.blank_name, self.duplicates, self.without_store
        )
    }
}

/// "Non Aktif" / "Tidak Aktif" mark an inactive agent; blank means active
fn parse_active(status: Option<String>) -> bool {
    match status {
        Some(s) => {
            let folded = s.to_lowercase();
            !(folded.contains("non") || folded.contains("tidak"))
        }
        None => true,
    }
}

/// Promoters deduplicate on case-insensitive name, first occurrence wins
pub fn extract_promoters(rows: &[SpreadsheetRow]) -> Extraction<PromoterDraft, PromoterStats> {
    let mut stats = PromoterStats {
        rows_read: rows.len(),
        ..PromoterStats::default()
    };

    let mut candidates = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(name) = row.text(COL_PROMOTER_NAME) else {
            stats.blank_name += 1;
            continue;
        };

        let target = row
            .get(COL_TARGET)
            .as_number()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n.trunc() as i64)
            .unwrap_or(0);

        candidates.push(PromoterDraft {
            name: name.split_whitespace().collect::<Vec<_>>().join(" "),
            sator: row.text(COL_SATOR),
            target,
            store_id: row.text(COL_STORE_ID),
            is_active: parse_active(row.text(COL_STATUS)),
        });
    }

    let (records, duplicates) = dedupe_by_key(candidates, |p| name_key(&p.name));
    stats.duplicates = duplicates;
    stats.kept = records.len();
    stats.without_store = records.iter().filter(|p| p.store_id.is_none()).count();

    debug!(%stats, "Extracted promoters");
    Extraction { records, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::CellValue;

    fn row(name: &str, target: CellValue, store: &str, status: &str) -> SpreadsheetRow {
        SpreadsheetRow::new()
            .with(COL_PROMOTER_NAME, CellValue::Text(name.into()))
            .with(COL_SATOR, CellValue::Text("Andi".into()))
            .with(COL_TARGET, target)
            .with(COL_STORE_ID, CellValue::Text(store.into()))
            .with(COL_STATUS, CellValue::Text(status.into()))
    }

    #[test]
    fn test_promoter_fields() {
        let rows = vec![
            row("Maria  Goreti", CellValue::Number(25.0), "T1", "Aktif"),
            row("Yohanes", CellValue::Text("30".into()), "", "Non Aktif"),
            row("Petrus", CellValue::Text("banyak".into()), "T2", ""),
        ];

        let out = extract_promoters(&rows);
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.records[0].name, "Maria Goreti");
        assert_eq!(out.records[0].target, 25);
        assert!(out.records[0].is_active);
        assert_eq!(out.records[1].store_id, None);
        assert!(!out.records[1].is_active);
        assert_eq!(out.records[2].target, 0);
        assert_eq!(out.stats.without_store, 1);
    }

    #[test]
    fn test_dedupe_on_folded_name() {
        let rows = vec![
            row("Maria Goreti", CellValue::Number(10.0), "T1", ""),
            row("MARIA GORETI ", CellValue::Number(99.0), "T9", ""),
            row("", CellValue::Number(1.0), "T1", ""),
        ];

        let out = extract_promoters(&rows);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].target, 10);
        assert_eq!(out.stats.duplicates, 1);
        assert_eq!(out.stats.blank_name, 1);
    }
}
