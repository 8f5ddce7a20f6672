//! promo-ingest library
//!
//! Reconciles the hand-maintained sales workbook into the relational
//! store. Leaf-first:
//! - [`normalize`]: dates, status, occupation and area classification
//! - [`spreadsheet`] and [`extract`]: rows in, validated records out
//! - [`batch`]: chunked writer with partial-success reporting
//! - [`hierarchy`]: area, employee id and supervisor assignment
//! - [`partition`]: the legacy/successor seam
//! - [`credentials`] and [`cleanup`]: account provisioning and photo retention

pub mod batch;
pub mod cleanup;
pub mod commands;
pub mod credentials;
pub mod db;
pub mod extract;
pub mod hierarchy;
pub mod normalize;
pub mod partition;
pub mod spreadsheet;
