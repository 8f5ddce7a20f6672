//! Shared-secret comparison for trigger endpoints
//!
//! Both sides are reduced to SHA-256 digests before comparison, so the
//! comparison time does not depend on where the raw strings first differ.

use sha2::{Digest, Sha256};

/// Hex SHA-256 of `value`
pub fn sha256_hex(value: &[u8]) -> String {
    format!("{:x}", Sha256::digest(value))
}

/// True when `provided` matches the configured secret.
///
/// An unset or blank configured secret never matches.
pub fn secrets_match(configured: Option<&str>, provided: Option<&str>) -> bool {
    let (Some(configured), Some(provided)) = (configured, provided) else {
        return false;
    };
    if configured.trim().is_empty() {
        return false;
    }

    let expected = Sha256::digest(configured.as_bytes());
    let actual = Sha256::digest(provided.as_bytes());

    expected
        .iter()
        .zip(actual.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
