//! Sale status classification
//!
//! Pending is checked before reject: several pending phrasings also
//! contain negation words ("dapat limit tapi belum ambil HP").

use promo_common::db::SaleStatus;

use super::{first_match, fold, Rule};

const STATUS_RULES: &[Rule<SaleStatus>] = &[
    Rule::exact(&["acc"], SaleStatus::Acc),
    Rule::contains(&["dapat limit", "pending"], SaleStatus::Pending),
    Rule::contains(
        &["reject", "belum", "tidak", "no limit", "tolak", "sistem", "error"],
        SaleStatus::Reject,
    ),
];

/// Result of classifying a raw status cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusClass {
    Known(SaleStatus),
    /// No rule matched; carries the folded text
    Unrecognized(String),
}

impl StatusClass {
    /// Three-value outcome; unrecognized text lands in the rejected bucket
    pub fn terminal(&self) -> SaleStatus {
        match self {
            StatusClass::Known(status) => *status,
            StatusClass::Unrecognized(_) => SaleStatus::Reject,
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, StatusClass::Known(_))
    }
}

pub fn classify_status(raw: &str) -> StatusClass {
    let folded = fold(raw);
    match first_match(STATUS_RULES, &folded) {
        Some(status) => StatusClass::Known(status),
        None => StatusClass::Unrecognized(folded),
    }
}
