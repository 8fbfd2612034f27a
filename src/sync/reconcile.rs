// src/sync/reconcile.rs

//! Post-write reconciliation.
//!
//! The bulk write primitive reports aggregate counts only, so per-row
//! success cannot be read from the write result. Instead, after the profile
//! bulk write, a single read selects the key field for every submitted
//! application number; any key absent from the result is classified as
//! failed. The update never upserts, so a key that did not exist before the
//! batch cannot appear afterwards. This cannot distinguish "already matched
//! the target values" from a failed write, but it correctly separates
//! "exists after the batch" from "does not exist".

use tracing::info;

use super::BatchPlan;
use crate::error::Result;
use crate::store::SyncStore;

/// Execute profile updates and classify per-row success.
///
/// Returns the full failure list: planning-time failures first, then every
/// submitted key missing from the existence check, in submission order.
/// The existence check runs even when there were zero update operations.
pub async fn reconcile<S: SyncStore + ?Sized>(store: &S, plan: &BatchPlan) -> Result<Vec<String>> {
    let mut failed = plan.failed.clone();

    if plan.updates.is_empty() {
        info!("No profile updates to perform (no mappable fields found in batch)");
    } else {
        let modified = store.bulk_update_profiles(&plan.updates).await?;
        info!("Updated {} profile record(s)", modified);
    }

    if !plan.application_numbers.is_empty() {
        let existing = store
            .existing_application_numbers(&plan.application_numbers)
            .await?;
        for key in &plan.application_numbers {
            if !existing.contains(key) && !failed.contains(key) {
                failed.push(key.clone());
            }
        }
    }

    Ok(failed)
}

/// Execute credential upserts.
///
/// Fire-and-forget with respect to the failure report: aggregate counts are
/// logged but never feed `failedRows`.
pub async fn write_credentials<S: SyncStore + ?Sized>(store: &S, plan: &BatchPlan) -> Result<()> {
    if plan.credentials.is_empty() {
        return Ok(());
    }

    let summary = store.bulk_upsert_credentials(&plan.credentials).await?;
    info!(
        "Credentials upserted: {}, modified: {}",
        summary.upserted, summary.modified
    );
    Ok(())
}
