//! Normalizers for hand-maintained spreadsheet values
//!
//! Free-text classification (status, occupation, area) is expressed as
//! ordered rule tables evaluated first-match-wins. Rule order is behavior:
//! reordering a table changes classifications.

pub mod area;
pub mod date;
pub mod occupation;
pub mod status;

pub use area::{canonical_area, AreaAssignment};
pub use date::{canonical_date, format_canonical, normalize_date, to_serial, DateError};
pub use occupation::{classify_occupation, Occupation};
pub use status::{classify_status, StatusClass};

/// How a rule's needles are compared with the lower-cased input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Whole (trimmed) text equals a needle
    Exact,
    /// Text contains a needle
    Contains,
}

/// One row of an ordered classification table
#[derive(Debug, Clone, Copy)]
pub struct Rule<T: 'static> {
    pub kind: MatchKind,
    pub needles: &'static [&'static str],
    pub result: T,
}

impl<T: Copy> Rule<T> {
    pub const fn exact(needles: &'static [&'static str], result: T) -> Self {
        Self {
            kind: MatchKind::Exact,
            needles,
            result,
        }
    }

    pub const fn contains(needles: &'static [&'static str], result: T) -> Self {
        Self {
            kind: MatchKind::Contains,
            needles,
            result,
        }
    }

    fn matches(&self, text: &str) -> bool {
        match self.kind {
            MatchKind::Exact => self.needles.iter().any(|n| text == *n),
            MatchKind::Contains => self.needles.iter().any(|n| text.contains(n)),
        }
    }
}

/// Lower-case and trim, the form every rule table expects
pub fn fold(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// First rule matching `folded`, in table order
pub fn first_match<T: Copy>(rules: &[Rule<T>], folded: &str) -> Option<T> {
    rules.iter().find(|r| r.matches(folded)).map(|r| r.result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &[Rule<u8>] = &[
        Rule::exact(&["ok"], 1),
        Rule::contains(&["ok"], 2),
        Rule::contains(&["no"], 3),
    ];

    #[test]
    fn test_first_match_wins() {
        assert_eq!(first_match(RULES, "ok"), Some(1));
        assert_eq!(first_match(RULES, "not ok"), Some(2));
        assert_eq!(first_match(RULES, "nope"), Some(3));
        assert_eq!(first_match(RULES, "maybe"), None);
    }

    #[test]
    fn test_fold() {
        assert_eq!(fold("  Dapat LIMIT "), "dapat limit");
    }
}
