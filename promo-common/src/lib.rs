//! # Promo Common Library
//!
//! Shared code for the promo reconciliation tools including:
//! - Error taxonomy
//! - Configuration loading
//! - Database initialization and schema
//! - Domain enumerations (areas, roles, sale status, fact tables)
//! - Shared-secret comparison

pub mod config;
pub mod db;
pub mod error;
pub mod secret;

pub use error::{Error, Result};
