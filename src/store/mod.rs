// src/store/mod.rs

//! Store abstraction for the two synced collections.
//!
//! The worker only needs four capabilities: an unordered bulk update against
//! the profile collection, an existence check over a set of application
//! numbers, an unordered bulk upsert against the auth users collection, and
//! a one-shot role lookup. Keeping them behind a trait lets the reconciler
//! and handler run against a fake store in tests.

pub mod mongo;

use std::collections::HashSet;

use async_trait::async_trait;
use mongodb::bson::{Document, oid::ObjectId};

use crate::error::Result;

// Re-export for convenience
pub use mongo::MongoStore;

/// A targeted partial update of one profile document.
///
/// Never creates a document: if no profile bears the key, the operation
/// executes but modifies nothing.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    /// The `applicationNumber` the update is filtered by
    pub application_number: String,

    /// The `$set` field set (excludes the key)
    pub fields: Document,
}

/// A create-or-update write of one credential document.
#[derive(Debug, Clone)]
pub struct CredentialUpsert {
    /// The `userEmail` the upsert is filtered by
    pub email: String,

    /// The full credential document
    pub document: Document,
}

/// Aggregate counts from a credential bulk write.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialWriteSummary {
    pub upserted: u64,
    pub modified: u64,
}

/// Trait for the backing store of both synced collections.
///
/// Bulk writes are unordered: one operation's failure does not abort its
/// siblings, and only aggregate counts come back. Per-row success is inferred
/// afterwards through [`existing_application_numbers`].
///
/// [`existing_application_numbers`]: SyncStore::existing_application_numbers
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Apply profile updates as one unordered bulk write.
    ///
    /// Returns the aggregate modified count only.
    async fn bulk_update_profiles(&self, updates: &[ProfileUpdate]) -> Result<u64>;

    /// Which of the given application numbers exist in the profile
    /// collection right now.
    async fn existing_application_numbers(&self, keys: &[String]) -> Result<HashSet<String>>;

    /// Apply credential upserts as one unordered bulk write.
    async fn bulk_upsert_credentials(
        &self,
        upserts: &[CredentialUpsert],
    ) -> Result<CredentialWriteSummary>;

    /// Look up the role reference for the given role name.
    async fn find_role_id(&self, role_name: &str) -> Result<Option<ObjectId>>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fake in-memory store for reconciler and handler tests.

    use std::sync::Mutex;

    use super::*;
    use crate::error::AppError;

    /// Test double backed by a set of pre-existing application numbers.
    #[derive(Debug, Default)]
    pub struct FakeStore {
        /// Application numbers that "exist" in the profile collection
        pub existing: HashSet<String>,

        /// Role id returned by `find_role_id`
        pub role_id: Option<ObjectId>,

        /// Error injection flags
        pub fail_profile_writes: bool,
        pub fail_credential_writes: bool,
        pub fail_role_lookup: bool,

        /// Recorded operations
        pub profile_updates: Mutex<Vec<ProfileUpdate>>,
        pub credential_upserts: Mutex<Vec<CredentialUpsert>>,
    }

    impl FakeStore {
        pub fn with_existing(keys: &[&str]) -> Self {
            Self {
                existing: keys.iter().map(|key| key.to_string()).collect(),
                role_id: Some(ObjectId::new()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl SyncStore for FakeStore {
        async fn bulk_update_profiles(&self, updates: &[ProfileUpdate]) -> Result<u64> {
            if self.fail_profile_writes {
                return Err(AppError::validation("injected profile write failure"));
            }
            let modified = updates
                .iter()
                .filter(|update| self.existing.contains(&update.application_number))
                .count() as u64;
            self.profile_updates.lock().unwrap().extend_from_slice(updates);
            Ok(modified)
        }

        async fn existing_application_numbers(&self, keys: &[String]) -> Result<HashSet<String>> {
            Ok(keys
                .iter()
                .filter(|key| self.existing.contains(*key))
                .cloned()
                .collect())
        }

        async fn bulk_upsert_credentials(
            &self,
            upserts: &[CredentialUpsert],
        ) -> Result<CredentialWriteSummary> {
            if self.fail_credential_writes {
                return Err(AppError::validation("injected credential write failure"));
            }
            self.credential_upserts
                .lock()
                .unwrap()
                .extend_from_slice(upserts);
            Ok(CredentialWriteSummary {
                upserted: upserts.len() as u64,
                modified: 0,
            })
        }

        async fn find_role_id(&self, _role_name: &str) -> Result<Option<ObjectId>> {
            if self.fail_role_lookup {
                return Err(AppError::validation("injected role lookup failure"));
            }
            Ok(self.role_id)
        }
    }
}
