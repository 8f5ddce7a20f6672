//! Reconciliation/Partition Enforcer
//!
//! `legacy_sales` and `sales` form one date-partitioned log with a seam at
//! the cutover date. [`reconcile_window`] replays one window from source in
//! two compensating phases (delete, then insert); [`verify_window`] checks
//! the result afterwards instead of relying on a transaction.

mod enforcer;
mod verify;

pub use enforcer::{reconcile_window, ReconcileReport};
pub use verify::{verify_window, VerificationReport, Violation};
