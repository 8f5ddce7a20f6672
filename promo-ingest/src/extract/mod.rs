//! Entity extraction and deduplication
//!
//! Each extractor consumes every raw row of one entity type and returns
//! the validated records plus a stats block. Rows are never an error:
//! incomplete rows are dropped and counted under the first failing reason.

pub mod promoters;
pub mod sales;
pub mod stores;

pub use promoters::{extract_promoters, PromoterDraft, PromoterStats, PROMOTER_HEADERS};
pub use sales::{extract_sales, SaleDraft, SaleStats, SALE_HEADERS};
pub use stores::{extract_stores, StoreDraft, StoreStats, STORE_HEADERS};

use std::collections::HashSet;
use std::hash::Hash;

/// Validated records of one entity type
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction<T, S> {
    pub records: Vec<T>,
    pub stats: S,
}

/// Keep the first record per key, in input order. Returns the number dropped.
pub fn dedupe_by_key<T, K, F>(records: Vec<T>, mut key: F) -> (Vec<T>, usize)
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    let before = records.len();
    let kept: Vec<T> = records.into_iter().filter(|r| seen.insert(key(r))).collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Case- and spacing-insensitive form of a name, used as a natural key
pub fn name_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
