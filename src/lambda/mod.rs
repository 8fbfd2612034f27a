// src/lambda/mod.rs

//! AWS Lambda handler for the sync worker.
//!
//! This module provides the Lambda function entry point that:
//! 1. Validates and maps the batch rows
//! 2. Bulk-updates the student profile collection
//! 3. Reconciles per-row success through an existence check
//! 4. Upserts login credentials for rows with a college email
//!
//! The handler always responds with the `{success, message, failedRows}`
//! contract; no error escapes past its boundary.

use chrono::Utc;
use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::credentials::STUDENT_ROLE_NAME;
use crate::error::AppError;
use crate::mapping::source_key;
use crate::models::Row;
use crate::store::SyncStore;
use crate::sync::{build_plan, reconcile, write_credentials};

/// Lambda invocation payload.
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    /// The rows delivered in this invocation
    #[serde(default)]
    pub batch: Vec<Row>,
}

/// Lambda response payload.
#[derive(Debug, Serialize)]
pub struct SyncReport {
    /// Whether every row landed
    pub success: bool,

    /// Human-readable outcome summary
    pub message: String,

    /// Primary-key values of rows that did not result in a persisted update
    #[serde(rename = "failedRows")]
    pub failed_rows: Vec<String>,
}

impl SyncReport {
    fn from_failures(failed_rows: Vec<String>) -> Self {
        let success = failed_rows.is_empty();
        let message = if success {
            "All rows updated"
        } else {
            "Some records failed"
        };
        Self {
            success,
            message: message.to_string(),
            failed_rows,
        }
    }

    fn failure(message: impl Into<String>, failed_rows: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            failed_rows,
        }
    }
}

/// Main Lambda handler function.
#[instrument(skip(event, store))]
pub async fn handler<S: SyncStore>(
    event: LambdaEvent<SyncRequest>,
    store: &S,
) -> std::result::Result<SyncReport, LambdaError> {
    let start = std::time::Instant::now();
    let (request, _context) = event.into_parts();

    info!("Starting batch sync: {} row(s)", request.batch.len());
    let report = run_sync(store, &request.batch).await;
    info!(
        "Batch sync finished in {}ms: success={}, failed_rows={}",
        start.elapsed().as_millis(),
        report.success,
        report.failed_rows.len()
    );

    Ok(report)
}

/// Run one batch sync against the store.
pub async fn run_sync<S: SyncStore + ?Sized>(store: &S, batch: &[Row]) -> SyncReport {
    if batch.is_empty() {
        return SyncReport::failure("No batch data provided", Vec::new());
    }

    // Role reference is resolved once per batch; a missing role is logged
    // but credentials proceed with empty role arrays.
    let role_id = match store.find_role_id(STUDENT_ROLE_NAME).await {
        Ok(Some(id)) => Some(id),
        Ok(None) => {
            error!(
                "{} auth role not found in auth roles collection",
                STUDENT_ROLE_NAME
            );
            None
        }
        Err(e) => return infrastructure_failure(batch, &[], e),
    };

    let plan = build_plan(batch, role_id, Utc::now().timestamp_millis());

    let failed_rows = match reconcile(store, &plan).await {
        Ok(failed) => failed,
        Err(e) => return infrastructure_failure(batch, &plan.failed, e),
    };

    if let Err(e) = write_credentials(store, &plan).await {
        return infrastructure_failure(batch, &failed_rows, e);
    }

    SyncReport::from_failures(failed_rows)
}

/// Conservative failure response: every row not already marked failed is
/// reported as failed.
fn infrastructure_failure(batch: &[Row], known: &[String], error: AppError) -> SyncReport {
    error!("Unexpected error during batch sync: {}", error);

    let mut failed_rows = known.to_vec();
    for row in batch {
        let key = source_key(row);
        if !failed_rows.contains(&key) {
            failed_rows.push(key);
        }
    }

    SyncReport::failure(format!("Unhandled exception: {}", error), failed_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::FakeStore;
    use serde_json::{Value, json};

    fn make_row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect()
    }

    fn make_batch(keys: &[&str]) -> Vec<Row> {
        keys.iter()
            .map(|key| {
                make_row(&[
                    ("Application Number", json!(key)),
                    ("RollNo", json!("r1")),
                    ("College Email Id", json!(format!("{key}@college.edu"))),
                ])
            })
            .collect()
    }

    #[test]
    fn test_request_defaults() {
        let request: SyncRequest = serde_json::from_str("{}").unwrap();
        assert!(request.batch.is_empty());
    }

    #[test]
    fn test_report_serializes_failed_rows_key() {
        let report = SyncReport::from_failures(vec!["A1".to_string()]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failedRows"], json!(["A1"]));
        assert_eq!(json["success"], json!(false));
    }

    #[tokio::test]
    async fn test_empty_batch_fails_without_rows() {
        let store = FakeStore::with_existing(&[]);
        let report = run_sync(&store, &[]).await;

        assert!(!report.success);
        assert_eq!(report.message, "No batch data provided");
        assert!(report.failed_rows.is_empty());
    }

    #[tokio::test]
    async fn test_all_rows_updated() {
        let store = FakeStore::with_existing(&["A1", "A2"]);
        let report = run_sync(&store, &make_batch(&["A1", "A2"])).await;

        assert!(report.success);
        assert_eq!(report.message, "All rows updated");
        assert!(report.failed_rows.is_empty());
        assert_eq!(store.credential_upserts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_partial_failure_reports_missing_keys() {
        let store = FakeStore::with_existing(&["A1"]);
        let report = run_sync(&store, &make_batch(&["A1", "A2", "A3"])).await;

        assert!(!report.success);
        assert_eq!(report.message, "Some records failed");
        assert_eq!(report.failed_rows, vec!["A2", "A3"]);
    }

    #[tokio::test]
    async fn test_missing_role_is_non_fatal() {
        let store = FakeStore {
            role_id: None,
            ..FakeStore::with_existing(&["A1"])
        };
        let report = run_sync(&store, &make_batch(&["A1"])).await;

        assert!(report.success);
        let recorded = store.credential_upserts.lock().unwrap();
        assert!(
            recorded[0]
                .document
                .get_array(crate::credentials::fields::AUTH_ROLES)
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_infrastructure_failure_fails_every_row() {
        let store = FakeStore {
            fail_profile_writes: true,
            ..FakeStore::with_existing(&["A1"])
        };
        let mut batch = vec![make_row(&[("RollNo", json!("orphan"))])];
        batch.extend(make_batch(&["A1", "A2"]));
        let report = run_sync(&store, &batch).await;

        assert!(!report.success);
        assert!(report.message.starts_with("Unhandled exception:"));
        // Planning-time failure first, then every other row.
        assert_eq!(report.failed_rows, vec!["", "A1", "A2"]);
    }

    #[tokio::test]
    async fn test_credential_write_failure_takes_conservative_path() {
        let store = FakeStore {
            fail_credential_writes: true,
            ..FakeStore::with_existing(&["A1"])
        };
        let report = run_sync(&store, &make_batch(&["A1"])).await;

        assert!(!report.success);
        assert!(report.message.starts_with("Unhandled exception:"));
        assert_eq!(report.failed_rows, vec!["A1"]);
    }

    #[tokio::test]
    async fn test_role_lookup_failure_takes_conservative_path() {
        let store = FakeStore {
            fail_role_lookup: true,
            ..FakeStore::with_existing(&["A1"])
        };
        let report = run_sync(&store, &make_batch(&["A1"])).await;

        assert!(!report.success);
        assert_eq!(report.failed_rows, vec!["A1"]);
    }
}
