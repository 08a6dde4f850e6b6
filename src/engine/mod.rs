//! Execution engine for converge
//!
//! The engine orchestrates:
//! 1. Planning - Build service resources from the manifest
//! 2. Diffing - Compute current vs desired state
//! 3. Executing - Apply changes with parallelism and sudo batching

pub mod differ;
pub mod executor;
pub mod planner;

pub use executor::{ApplyOptions, apply};
pub use planner::build_plan;
