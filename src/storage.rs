use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("not_found")]
    NotFound,
    #[error("other: {0}")]
    Other(String),
}

/// Bytes of an uploaded file, held until the registry entry is released.
#[derive(Debug, Clone)]
pub struct Blob {
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

/// Session-scoped byte storage for uploaded files, keyed by registry id.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, mime: &str, bytes: Vec<u8>) -> Result<(), BlobStoreError>;
    async fn get(&self, key: &str) -> Result<Blob, BlobStoreError>;
    /// Drops the bytes for `key`. Releasing an unknown key is not an error.
    async fn release(&self, key: &str) -> Result<(), BlobStoreError>;
    /// Drops everything; called when the session ends.
    async fn release_all(&self) -> Result<usize, BlobStoreError>;
}

#[derive(Clone, Default)]
pub struct InMemBlobStore {
    blobs: Arc<DashMap<String, Blob>>,
}

impl InMemBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemBlobStore {
    async fn put(&self, key: &str, mime: &str, bytes: Vec<u8>) -> Result<(), BlobStoreError> {
        debug!(key, mime, size = bytes.len(), "storing blob");
        self.blobs.insert(key.to_string(), Blob { mime: mime.to_string(), bytes: bytes.into() });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Blob, BlobStoreError> {
        self.blobs.get(key).map(|b| b.value().clone()).ok_or(BlobStoreError::NotFound)
    }

    async fn release(&self, key: &str) -> Result<(), BlobStoreError> {
        if self.blobs.remove(key).is_some() {
            debug!(key, "blob released");
        }
        Ok(())
    }

    async fn release_all(&self) -> Result<usize, BlobStoreError> {
        let n = self.blobs.len();
        self.blobs.clear();
        info!(released = n, "all blobs released");
        Ok(n)
    }
}
