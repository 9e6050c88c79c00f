//! Object storage seam
//!
//! The blob store itself (S3-compatible in production) lives outside this
//! crate; uploads only need `put` and `get`.

#![allow(async_fn_in_trait)]

use crate::error::{UploadError, UploadResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// A stored object's key and public URL
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// External key/value blob store
pub trait ObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> UploadResult<StoredObject>;

    async fn get(&self, key: &str) -> UploadResult<StoredObject>;
}

#[derive(Debug, Clone)]
struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
}

/// In-memory object store serving URLs under a base URL
#[derive(Debug)]
pub struct MemoryStore {
    base_url: String,
    objects: RwLock<HashMap<String, StoredBlob>>,
}

impl MemoryStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored bytes and content type of `key`
    pub fn contents(&self, key: &str) -> Option<(Vec<u8>, String)> {
        let objects = self.objects.read().ok()?;
        objects
            .get(key)
            .map(|b| (b.bytes.clone(), b.content_type.clone()))
    }
}

impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> UploadResult<StoredObject> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| UploadError::Storage("store lock poisoned".to_string()))?;
        objects.insert(
            key.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(StoredObject {
            key: key.to_string(),
            url: self.url_for(key),
        })
    }

    async fn get(&self, key: &str) -> UploadResult<StoredObject> {
        let objects = self
            .objects
            .read()
            .map_err(|_| UploadError::Storage("store lock poisoned".to_string()))?;
        if !objects.contains_key(key) {
            return Err(UploadError::NotFound(key.to_string()));
        }
        Ok(StoredObject {
            key: key.to_string(),
            url: self.url_for(key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get() {
        let store = MemoryStore::new("https://cdn.geolab.example/");
        let put = smol::block_on(store.put("resources/1-a.pdf", b"%PDF".to_vec(), "application/pdf")).unwrap();
        assert_eq!(put.url, "https://cdn.geolab.example/resources/1-a.pdf");

        let got = smol::block_on(store.get("resources/1-a.pdf")).unwrap();
        assert_eq!(got, put);
        assert_eq!(
            store.contents("resources/1-a.pdf"),
            Some((b"%PDF".to_vec(), "application/pdf".to_string()))
        );
    }

    #[test]
    fn test_get_missing() {
        let store = MemoryStore::new("https://cdn.geolab.example");
        assert_eq!(
            smol::block_on(store.get("resources/none")),
            Err(UploadError::NotFound("resources/none".to_string()))
        );
        assert!(store.is_empty());
    }
}
