//! Hierarchy Assignment Engine
//!
//! Two independent operations:
//! - [`assign_hierarchy`]: links every unlinked promoter to an area, an
//!   employee identifier, a supervisor and a fresh account
//! - [`rebuild_area_hierarchy`]: full replace of the per-(area, sator)
//!   aggregate

pub mod aggregate;
pub mod assign;

pub use aggregate::{rebuild_area_hierarchy, AreaHierarchyEntry};
pub use assign::{
    assign_hierarchy, AssignedAgent, AssignmentReport, FailedAgent, SequenceCounters, SkippedAgent,
};
