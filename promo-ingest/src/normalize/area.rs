//! Store area label -> canonical area
//!
//! Unmatched labels fall back to KUPANG. The fallback is reported through
//! [`AreaAssignment::fallback`] so callers can count it.

use promo_common::db::Area;

use super::{first_match, fold, Rule};

const AREA_RULES: &[Rule<Area>] = &[
    Rule::contains(&["kupang", "kota"], Area::Kupang),
    Rule::contains(&["kabupaten", "kab"], Area::Kabupaten),
    Rule::contains(&["sumba"], Area::Sumba),
];

pub const FALLBACK_AREA: Area = Area::Kupang;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaAssignment {
    pub area: Area,
    /// No rule matched the label
    pub fallback: bool,
}

pub fn canonical_area(label: Option<&str>) -> AreaAssignment {
    let folded = label.map(fold).unwrap_or_default();
    match first_match(AREA_RULES, &folded) {
        Some(area) => AreaAssignment {
            area,
            fallback: false,
        },
        None => AreaAssignment {
            area: FALLBACK_AREA,
            fallback: true,
        },
    }
}
