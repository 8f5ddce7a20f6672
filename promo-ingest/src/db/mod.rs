//! Store access for promo-ingest
//!
//! One module per collection. Every function issues independent
//! statements; callers decide how failures are tallied.

pub mod accounts;
pub mod photos;
pub mod promoters;
pub mod runs;
pub mod sales;
pub mod stores;
