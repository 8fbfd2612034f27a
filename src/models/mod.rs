// src/models/mod.rs

//! Domain models for the sync worker.

mod row;

// Re-export all public types
pub use row::{MappedRow, Row, ValidRow};
