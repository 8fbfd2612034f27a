//! Lambda entry point for the roster sync worker.
//!
//! Invoked once per batch by the upstream import trigger, which owns
//! chunking batches to `MONGO_WRITE_BATCH_SIZE` and any retry policy.
//!
//! ## Environment Variables
//!
//! - `MONGO_CONNECTION_URI`: MongoDB connection string (required)
//! - `MONGO_DATABASE`: Target database name (required)
//! - `MONGO_MAX_POOL_SIZE`: Maximum connection pool size (default: 5)
//! - `MONGO_CONNECT_TIMEOUT_MS`: TCP connect timeout (default: 3000)
//! - `MONGO_SELECTION_TIMEOUT_MS`: Server selection timeout (default: 5000)
//! - `MONGO_WRITE_BATCH_SIZE`: Declared batch size threshold (default: 500)
//! - `RUST_LOG`: Log level (e.g., `info`, `debug`)

use std::sync::Arc;

use lambda_runtime::{LambdaEvent, service_fn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roster_sync::config::SyncConfig;
use roster_sync::lambda::{SyncRequest, handler};
use roster_sync::store::MongoStore;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    // Initialize tracing for Lambda
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Roster sync worker starting...");

    let config = SyncConfig::from_env()?;
    config.validate()?;

    // One client per process lifetime, shared across invocations.
    let store = Arc::new(MongoStore::connect(&config).await?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<SyncRequest>| {
        let store = Arc::clone(&store);
        async move { handler(event, store.as_ref()).await }
    }))
    .await
}
