// src/config.rs

//! Environment-derived configuration for the sync worker.
//!
//! The worker runs in Lambda, so all configuration comes from environment
//! variables with sensible defaults for everything except the connection
//! endpoint and database name.

use crate::error::{AppError, Result};

/// Runtime configuration for the sync worker.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// MongoDB connection string
    pub connection_uri: String,

    /// Target database name
    pub database: String,

    /// Maximum connection pool size
    pub max_pool_size: u32,

    /// TCP connect timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Server selection timeout in milliseconds
    pub server_selection_timeout_ms: u64,

    /// Maximum rows per write batch. The invocation layer is responsible
    /// for chunking batches to this size; the worker does not re-split.
    pub write_batch_size: usize,
}

impl SyncConfig {
    /// Build configuration from environment variables.
    ///
    /// `MONGO_CONNECTION_URI` and `MONGO_DATABASE` are required; everything
    /// else falls back to defaults when unset or unparseable.
    pub fn from_env() -> Result<Self> {
        let connection_uri = std::env::var("MONGO_CONNECTION_URI")
            .map_err(|_| AppError::config("MONGO_CONNECTION_URI is not set"))?;
        let database = std::env::var("MONGO_DATABASE")
            .map_err(|_| AppError::config("MONGO_DATABASE is not set"))?;

        let mut config = Self {
            connection_uri,
            database,
            max_pool_size: defaults::max_pool_size(),
            connect_timeout_ms: defaults::connect_timeout_ms(),
            server_selection_timeout_ms: defaults::server_selection_timeout_ms(),
            write_batch_size: defaults::write_batch_size(),
        };

        if let Ok(value) = std::env::var("MONGO_MAX_POOL_SIZE") {
            if let Ok(size) = value.parse() {
                config.max_pool_size = size;
            }
        }

        if let Ok(value) = std::env::var("MONGO_CONNECT_TIMEOUT_MS") {
            if let Ok(ms) = value.parse() {
                config.connect_timeout_ms = ms;
            }
        }

        if let Ok(value) = std::env::var("MONGO_SELECTION_TIMEOUT_MS") {
            if let Ok(ms) = value.parse() {
                config.server_selection_timeout_ms = ms;
            }
        }

        if let Ok(value) = std::env::var("MONGO_WRITE_BATCH_SIZE") {
            if let Ok(size) = value.parse() {
                config.write_batch_size = size;
            }
        }

        Ok(config)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.connection_uri.trim().is_empty() {
            return Err(AppError::validation("connection_uri is empty"));
        }
        if self.database.trim().is_empty() {
            return Err(AppError::validation("database is empty"));
        }
        if self.max_pool_size == 0 {
            return Err(AppError::validation("max_pool_size must be > 0"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(AppError::validation("connect_timeout_ms must be > 0"));
        }
        if self.server_selection_timeout_ms == 0 {
            return Err(AppError::validation(
                "server_selection_timeout_ms must be > 0",
            ));
        }
        if self.write_batch_size == 0 {
            return Err(AppError::validation("write_batch_size must be > 0"));
        }
        Ok(())
    }
}

mod defaults {
    pub fn max_pool_size() -> u32 {
        5
    }
    pub fn connect_timeout_ms() -> u64 {
        3000
    }
    pub fn server_selection_timeout_ms() -> u64 {
        5000
    }
    pub fn write_batch_size() -> usize {
        500
    }
}
