//! Resource uploads
//!
//! Validate, derive a unique key, store. Validation failures are returned
//! to the caller; nothing is written to the store in that case.

use crate::data_url::DataUrl;
use crate::error::UploadResult;
use crate::filename::object_key;
use crate::policy::{FileCategory, UploadPolicy};
use crate::store::{ObjectStore, StoredObject};

/// Uploads resources into an [`ObjectStore`]
#[derive(Debug)]
pub struct Uploader<S> {
    store: S,
    policy: UploadPolicy,
}

impl<S: ObjectStore> Uploader<S> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, UploadPolicy::default())
    }

    pub fn with_policy(store: S, policy: UploadPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Upload raw bytes, keyed by the current time
    pub async fn upload(
        &self,
        category: FileCategory,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> UploadResult<StoredObject> {
        let now = chrono::Utc::now().timestamp_millis();
        self.upload_at(now, category, filename, content_type, bytes).await
    }

    /// Upload with an explicit key timestamp (milliseconds since the epoch)
    pub async fn upload_at(
        &self,
        timestamp_ms: i64,
        category: FileCategory,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> UploadResult<StoredObject> {
        if let Err(err) = self.policy.validate(category, content_type, bytes.len() as u64) {
            tracing::info!("rejected upload {:?}: {}", filename, err);
            return Err(err);
        }

        let key = object_key(timestamp_ms, filename);
        let stored = self.store.put(&key, bytes, content_type).await?;
        tracing::info!("stored {} as {}", filename, stored.key);
        Ok(stored)
    }

    /// Upload a browser `data:` URL; its media type is the content type
    pub async fn upload_data_url(
        &self,
        category: FileCategory,
        filename: &str,
        data_url: &str,
    ) -> UploadResult<StoredObject> {
        let DataUrl { mime, bytes } = DataUrl::parse(data_url)?;
        self.upload(category, filename, &mime, bytes).await
    }

    /// Public URL of a stored resource
    pub async fn resolve(&self, key: &str) -> UploadResult<StoredObject> {
        self.store.get(key).await
    }
}
