// src/lib.rs

//! Roster Sync Worker Library

pub mod config;
pub mod credentials;
pub mod error;
pub mod lambda;
pub mod mapping;
pub mod models;
pub mod store;
pub mod sync;
