// src/sync/mod.rs

//! Batch planning and reconciliation.
//!
//! - `plan`: turn raw rows into the two operation sets plus early failures
//! - `reconcile`: execute profile writes and infer per-row success from a
//!   post-write existence check

pub mod plan;
pub mod reconcile;

pub use plan::{BatchPlan, build_plan};
pub use reconcile::{reconcile, write_credentials};
