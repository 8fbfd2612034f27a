// src/credentials.rs

//! Login credential provisioning for synced profiles.
//!
//! Every mapped row with a college email gets a matching document in the
//! auth users collection: the email doubles as the secret source (a known
//! simplification of the upstream system), hashed with bcrypt, plus the
//! active flag, a creation timestamp, and the student role reference.

use mongodb::bson::{Bson, doc, oid::ObjectId};
use tracing::error;

use crate::error::{AppError, Result};
use crate::models::ValidRow;
use crate::store::CredentialUpsert;

/// Role name looked up once per batch in the auth roles collection.
pub const STUDENT_ROLE_NAME: &str = "STUDENT";

/// Auth user document field names.
pub mod fields {
    pub const USER_EMAIL: &str = "userEmail";
    pub const USER_PASSWORD: &str = "userPassword";
    pub const IS_ACTIVE: &str = "isActive";
    pub const CREATED_ON: &str = "createdOn";
    pub const AUTH_ROLES: &str = "authRoles";
}

const BCRYPT_COST: u32 = 10;

/// Hash a secret with bcrypt.
///
/// Empty input is the one loud failure here; callers treat it as a per-row
/// failure, not a batch-aborting one.
pub fn hash_secret(input: &str) -> Result<String> {
    if input.is_empty() {
        return Err(AppError::validation(
            "input string for hashing cannot be empty",
        ));
    }
    Ok(bcrypt::hash(input, BCRYPT_COST)?)
}

/// Build the credential upsert for a mapped row.
///
/// Returns `Ok(None)` when the row carries no college email. A hashing
/// failure is returned to the caller, which records the row as failed and
/// continues the batch.
pub fn build_credential(
    row: &ValidRow,
    role_id: Option<ObjectId>,
    now_millis: i64,
) -> Result<Option<CredentialUpsert>> {
    let Some(email) = row.email() else {
        return Ok(None);
    };

    let hashed_password = hash_secret(email).inspect_err(|error| {
        error!("Failed to hash password for email {}: {}", email, error);
    })?;

    let auth_roles = match role_id {
        Some(id) => vec![Bson::ObjectId(id)],
        None => Vec::new(),
    };

    let document = doc! {
        fields::USER_EMAIL: email,
        fields::USER_PASSWORD: hashed_password,
        fields::IS_ACTIVE: row.is_active(),
        fields::CREATED_ON: now_millis,
        fields::AUTH_ROLES: auth_roles,
    };

    Ok(Some(CredentialUpsert {
        email: email.to_string(),
        document,
    }))
}
