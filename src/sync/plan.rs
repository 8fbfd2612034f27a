// src/sync/plan.rs

//! Batch planning: raw rows to operation sets.
//!
//! Planning is pure. Rows that fail here (no usable application number, or
//! a credential hash failure) are recorded up front; everything that can
//! touch the store happens later in the reconcile step.

use mongodb::bson::oid::ObjectId;
use tracing::{error, warn};

use crate::credentials::build_credential;
use crate::mapping::validate_row;
use crate::models::{MappedRow, Row};
use crate::store::{CredentialUpsert, ProfileUpdate};

/// Operation sets and early failures for one batch.
#[derive(Debug, Default)]
pub struct BatchPlan {
    /// Profile updates, one per valid row with non-key fields
    pub updates: Vec<ProfileUpdate>,

    /// Credential upserts, one per valid row with an email
    pub credentials: Vec<CredentialUpsert>,

    /// Application numbers of all valid rows, in submission order
    pub application_numbers: Vec<String>,

    /// Rows already known to have failed, in submission order
    pub failed: Vec<String>,
}

/// Plan one batch of raw rows.
///
/// `role_id` is the role reference resolved once for the whole batch;
/// `now_millis` stamps every credential document built from this batch.
pub fn build_plan(batch: &[Row], role_id: Option<ObjectId>, now_millis: i64) -> BatchPlan {
    let mut plan = BatchPlan::default();

    for row in batch {
        let valid = match validate_row(row) {
            MappedRow::Valid(valid) => valid,
            MappedRow::Invalid { source_key } => {
                warn!("Row has no usable application number, skipping");
                plan.failed.push(source_key);
                continue;
            }
        };

        plan.application_numbers
            .push(valid.application_number.clone());

        let update_fields = valid.update_fields();
        if !update_fields.is_empty() {
            plan.updates.push(ProfileUpdate {
                application_number: valid.application_number.clone(),
                fields: update_fields,
            });
        }

        match build_credential(&valid, role_id, now_millis) {
            Ok(Some(upsert)) => plan.credentials.push(upsert),
            Ok(None) => {}
            Err(error) => {
                // Row-level failure: the profile update still proceeds, only
                // the credential is dropped.
                error!(
                    "Credential build failed for {}: {}",
                    valid.application_number, error
                );
                plan.failed.push(valid.application_number.clone());
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::fields;
    use serde_json::{Value, json};

    fn make_row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_update_excludes_primary_key() {
        let batch = vec![make_row(&[
            ("Application Number", json!("A100")),
            ("RollNo", json!("r1")),
        ])];
        let plan = build_plan(&batch, None, 0);

        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].application_number, "A100");
        assert!(
            !plan.updates[0]
                .fields
                .contains_key(fields::APPLICATION_NUMBER)
        );
        assert_eq!(
            plan.updates[0].fields.get_str(fields::ROLL_NUMBER).unwrap(),
            "R1"
        );
    }

    #[test]
    fn test_numeric_key_rows_are_planned() {
        let batch = vec![make_row(&[
            ("Application Number", json!(12345)),
            ("RollNo", json!("r1")),
        ])];
        let plan = build_plan(&batch, None, 0);

        assert!(plan.failed.is_empty());
        assert_eq!(plan.application_numbers, vec!["12345"]);
        assert_eq!(plan.updates[0].application_number, "12345");
    }

    #[test]
    fn test_key_only_row_gets_no_update_operation() {
        let batch = vec![make_row(&[("Application Number", json!("A100"))])];
        let plan = build_plan(&batch, None, 0);

        assert!(plan.updates.is_empty());
        assert_eq!(plan.application_numbers, vec!["A100"]);
        assert!(plan.failed.is_empty());
    }

    #[test]
    fn test_invalid_row_produces_no_operations() {
        let batch = vec![make_row(&[("RollNo", json!("r1"))])];
        let plan = build_plan(&batch, None, 0);

        assert!(plan.updates.is_empty());
        assert!(plan.credentials.is_empty());
        assert!(plan.application_numbers.is_empty());
        assert_eq!(plan.failed, vec![""]);
    }

    #[test]
    fn test_credential_built_only_for_rows_with_email() {
        let role_id = ObjectId::new();
        let batch = vec![
            make_row(&[
                ("Application Number", json!("A100")),
                ("College Email Id", json!("a100@college.edu")),
            ]),
            make_row(&[("Application Number", json!("A200"))]),
        ];
        let plan = build_plan(&batch, Some(role_id), 42);

        assert_eq!(plan.credentials.len(), 1);
        // The mapper upper-cases the email before the credential is built.
        assert_eq!(plan.credentials[0].email, "A100@COLLEGE.EDU");
        assert_eq!(plan.application_numbers, vec!["A100", "A200"]);
    }

    #[test]
    fn test_mixed_batch_ordering() {
        let batch = vec![
            make_row(&[("RollNo", json!("orphan"))]),
            make_row(&[
                ("Application Number", json!("A100")),
                ("Status", json!("Active")),
            ]),
            make_row(&[("Application Number", json!(""))]),
        ];
        let plan = build_plan(&batch, None, 0);

        assert_eq!(plan.failed, vec!["", ""]);
        assert_eq!(plan.application_numbers, vec!["A100"]);
        assert_eq!(plan.updates.len(), 1);
    }
}
