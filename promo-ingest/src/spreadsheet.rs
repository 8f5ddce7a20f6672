//! Source workbook reading
//!
//! The workbook is read synchronously and in full. Each sheet's first row
//! is its header row; every following non-blank row becomes a
//! [`SpreadsheetRow`] keyed by header name.

use calamine::{open_workbook_auto, Data, DataType, Range, Reader, Sheets};
use chrono::NaiveDate;
use promo_common::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One raw cell value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    /// Trimmed text form, `None` when blank.
    ///
    /// Whole numbers render without a decimal point so numeric store codes
    /// read the same as text ones.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            CellValue::Empty => return None,
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().replace(',', "").parse().ok(),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_text().is_none()
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(ndt) => CellValue::Date(ndt.date()),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) => s
                .get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
                .map(CellValue::Date)
                .unwrap_or_else(|| CellValue::Text(s.clone())),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

/// Header-keyed row, in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpreadsheetRow {
    cells: Vec<(String, CellValue)>,
}

impl SpreadsheetRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by tests and by the sheet reader
    pub fn with(mut self, header: &str, value: CellValue) -> Self {
        self.push(header, value);
        self
    }

    pub fn push(&mut self, header: &str, value: CellValue) {
        self.cells.push((header.to_string(), value));
    }

    /// Cell under `header`; missing columns read as empty
    pub fn get(&self, header: &str) -> &CellValue {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v)
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn text(&self, header: &str) -> Option<String> {
        self.get(header).as_text()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_blank())
    }
}

/// Convert a sheet range into rows, checking the header contract
pub fn rows_from_range(
    sheet: &str,
    range: &Range<Data>,
    required_headers: &[&str],
) -> Result<Vec<SpreadsheetRow>> {
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell.as_string().unwrap_or_default().trim().to_string())
            .collect(),
        None => Vec::new(),
    };

    let missing: Vec<&str> = required_headers
        .iter()
        .copied()
        .filter(|required| !headers.iter().any(|h| h == required))
        .collect();
    if !missing.is_empty() {
        return Err(Error::Spreadsheet(format!(
            "Sheet '{}' is missing column(s): {}",
            sheet,
            missing.join(", ")
        )));
    }

    let mut out = Vec::new();
    for cells in rows {
        let mut row = SpreadsheetRow::new();
        for (header, cell) in headers.iter().zip(cells.iter()) {
            if !header.is_empty() {
                row.push(header, CellValue::from(cell));
            }
        }
        if !row.is_blank() {
            out.push(row);
        }
    }

    debug!(sheet, rows = out.len(), "Read sheet");
    Ok(out)
}

/// An opened source workbook plus its content fingerprint
pub struct SourceWorkbook {
    path: PathBuf,
    sha256: String,
    sheets: Sheets<BufReader<File>>,
}

impl SourceWorkbook {
    pub fn open(path: &Path) -> Result<Self> {
        let sha256 = file_sha256(path)?;
        let sheets = open_workbook_auto(path).map_err(|e| {
            Error::Spreadsheet(format!("Failed to open {}: {}", path.display(), e))
        })?;

        info!(path = %path.display(), sha256 = %sha256, "Opened source workbook");

        Ok(Self {
            path: path.to_path_buf(),
            sha256,
            sheets,
        })
    }

    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Read one named sheet. A missing sheet breaks the input contract.
    pub fn sheet_rows(&mut self, name: &str, required_headers: &[&str]) -> Result<Vec<SpreadsheetRow>> {
        if !self.sheets.sheet_names().iter().any(|s| s == name) {
            return Err(Error::Spreadsheet(format!(
                "Sheet '{}' not found in {}",
                name,
                self.path.display()
            )));
        }

        let range = self
            .sheets
            .worksheet_range(name)
            .map_err(|e| Error::Spreadsheet(format!("Failed to read sheet '{}': {}", name, e)))?;

        rows_from_range(name, &range, required_headers)
    }

    /// Read several sheets sharing one header contract, concatenated in order
    pub fn concat_sheet_rows(
        &mut self,
        names: &[String],
        required_headers: &[&str],
    ) -> Result<Vec<SpreadsheetRow>> {
        let mut all = Vec::new();
        for name in names {
            all.extend(self.sheet_rows(name, required_headers)?);
        }
        Ok(all)
    }
}

/// Hex SHA-256 of a file's contents
pub fn file_sha256(path: &Path) -> Result<String> {
    let contents = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&contents)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(cells: &[&[Data]]) -> Range<Data> {
        let height = cells.len() as u32;
        let width = cells.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn test_rows_keyed_by_header() {
        let range = sheet(&[
            &[s("ID Toko"), s(" Nama Toko "), s("Area")],
            &[Data::Int(1023), s("Toko Maju"), s("Kota")],
            &[Data::Empty, Data::Empty, Data::Empty],
            &[s("T-2"), s("Toko Jaya"), Data::Empty],
        ]);

        let rows = rows_from_range("Toko", &range, &["ID Toko", "Nama Toko"]).unwrap();
        assert_eq!(rows.len(), 2, "blank row should be skipped");
        assert_eq!(rows[0].text("ID Toko").as_deref(), Some("1023"));
        assert_eq!(rows[0].text("Nama Toko").as_deref(), Some("Toko Maju"));
        assert_eq!(rows[1].get("Area"), &CellValue::Empty);
        assert_eq!(rows[1].get("Not A Column"), &CellValue::Empty);
    }

    #[test]
    fn test_missing_header_is_contract_break() {
        let range = sheet(&[&[s("Kode"), s("Nama Toko")], &[s("1"), s("x")]]);
        let err = rows_from_range("Toko", &range, &["ID Toko", "Nama Toko"]).unwrap_err();
        match err {
            Error::Spreadsheet(msg) => assert!(msg.contains("ID Toko"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_cell_conversion() {
        assert_eq!(CellValue::from(&Data::Float(45900.0)), CellValue::Number(45900.0));
        assert_eq!(CellValue::from(&Data::Bool(true)), CellValue::Text("true".into()));
        assert_eq!(
            CellValue::from(&Data::DateTimeIso("2025-09-15T00:00:00".into())),
            CellValue::Date(NaiveDate::from_ymd_opt(2025, 9, 15).unwrap())
        );
        assert_eq!(CellValue::Number(12.5).as_text().as_deref(), Some("12.5"));
        assert_eq!(CellValue::Text("1,500".into()).as_number(), Some(1500.0));
        assert!(CellValue::Text("  ".into()).is_blank());
    }

    #[test]
    fn test_file_sha256() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("x.bin");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            file_sha256(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
