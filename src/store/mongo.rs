// src/store/mongo.rs

//! MongoDB-backed store implementation.
//!
//! Built once at process start and shared across invocations; the driver
//! owns pooling and per-operation atomicity. Bulk writes go through the
//! client-level unordered bulk API, which reports aggregate counts only.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc, oid::ObjectId};
use mongodb::options::{ClientOptions, UpdateOneModel, WriteModel};
use mongodb::{Client, Collection, Database, Namespace};
use tracing::info;

use super::{CredentialUpsert, CredentialWriteSummary, ProfileUpdate, SyncStore};
use crate::config::SyncConfig;
use crate::credentials::fields as credential_fields;
use crate::error::Result;
use crate::mapping::fields;

/// Student profile collection (read + targeted update).
pub const STUDENT_PROFILE_COLLECTION: &str = "erp_student_profile";

/// Auth users collection (upsert).
pub const AUTH_USERS_COLLECTION: &str = "auth_users";

/// Auth roles collection (read-only lookup).
pub const AUTH_ROLES_COLLECTION: &str = "auth_roles";

const ROLE_NAME_FIELD: &str = "authRoleName";

/// MongoDB-backed [`SyncStore`].
pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    /// Connect using the given configuration.
    pub async fn connect(config: &SyncConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.connection_uri).await?;
        options.max_pool_size = Some(config.max_pool_size);
        options.connect_timeout = Some(Duration::from_millis(config.connect_timeout_ms));
        options.server_selection_timeout =
            Some(Duration::from_millis(config.server_selection_timeout_ms));
        options.retry_writes = Some(true);

        let client = Client::with_options(options)?;
        let database = client.database(&config.database);
        info!("MongoDB client initialized for database {}", config.database);

        Ok(Self { client, database })
    }

    fn profiles(&self) -> Collection<Document> {
        self.database.collection(STUDENT_PROFILE_COLLECTION)
    }

    fn namespace(&self, collection: &str) -> Namespace {
        Namespace::new(self.database.name(), collection)
    }
}

#[async_trait]
impl SyncStore for MongoStore {
    async fn bulk_update_profiles(&self, updates: &[ProfileUpdate]) -> Result<u64> {
        if updates.is_empty() {
            return Ok(0);
        }

        let namespace = self.namespace(STUDENT_PROFILE_COLLECTION);
        let models: Vec<WriteModel> = updates
            .iter()
            .map(|update| {
                WriteModel::UpdateOne(
                    UpdateOneModel::builder()
                        .namespace(namespace.clone())
                        .filter(doc! {
                            fields::APPLICATION_NUMBER: update.application_number.as_str(),
                        })
                        .update(doc! { "$set": update.fields.clone() })
                        .build(),
                )
            })
            .collect();

        let result = self.client.bulk_write(models).ordered(false).await?;
        Ok(result.modified_count as u64)
    }

    async fn existing_application_numbers(&self, keys: &[String]) -> Result<HashSet<String>> {
        let filter = doc! {
            fields::APPLICATION_NUMBER: { "$in": keys.to_vec() },
        };
        let mut cursor = self
            .profiles()
            .find(filter)
            .projection(doc! { fields::APPLICATION_NUMBER: 1, "_id": 0 })
            .await?;

        let mut existing = HashSet::new();
        while let Some(document) = cursor.try_next().await? {
            if let Ok(key) = document.get_str(fields::APPLICATION_NUMBER) {
                existing.insert(key.to_string());
            }
        }
        Ok(existing)
    }

    async fn bulk_upsert_credentials(
        &self,
        upserts: &[CredentialUpsert],
    ) -> Result<CredentialWriteSummary> {
        if upserts.is_empty() {
            return Ok(CredentialWriteSummary::default());
        }

        let namespace = self.namespace(AUTH_USERS_COLLECTION);
        let models: Vec<WriteModel> = upserts
            .iter()
            .map(|upsert| {
                WriteModel::UpdateOne(
                    UpdateOneModel::builder()
                        .namespace(namespace.clone())
                        .filter(doc! { credential_fields::USER_EMAIL: upsert.email.as_str() })
                        .update(doc! { "$set": upsert.document.clone() })
                        .upsert(true)
                        .build(),
                )
            })
            .collect();

        let result = self.client.bulk_write(models).ordered(false).await?;
        Ok(CredentialWriteSummary {
            upserted: result.upserted_count as u64,
            modified: result.modified_count as u64,
        })
    }

    async fn find_role_id(&self, role_name: &str) -> Result<Option<ObjectId>> {
        let document = self
            .database
            .collection::<Document>(AUTH_ROLES_COLLECTION)
            .find_one(doc! { ROLE_NAME_FIELD: role_name })
            .projection(doc! { "_id": 1 })
            .await?;

        Ok(document.and_then(|role| role.get_object_id("_id").ok()))
    }
}
