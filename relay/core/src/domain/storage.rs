// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Object Store Trait - Anti-Corruption Layer for object storage
//!
//! Provides abstraction over the storage backend so that the routing and
//! archiving services never touch a vendor client directly. The store is
//! injected into each service at construction, which lets tests substitute
//! the in-memory implementation.
//!
//! The core does not retry. Transient failures surface to the caller so the
//! invoking environment can apply its redrive policy.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Object storage operations used by the relay.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object in full
    ///
    /// # Returns
    /// * `Ok(Bytes)` - Object content
    /// * `Err(StorageError::NotFound)` if the object does not exist
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError>;

    /// Write an object, replacing any existing content
    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StorageError>;

    /// Copy an object, possibly across buckets
    ///
    /// The source is left in place. Backends with a server-side copy
    /// override this; the default streams through memory.
    async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<(), StorageError> {
        let body = self.get(src_bucket, src_key).await?;
        self.put(dst_bucket, dst_key, body).await
    }

    /// Check whether an object exists
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        match self.get(bucket, key).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete an object; deleting a missing object is not an error
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// List object keys in a bucket under a prefix, sorted
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Check health of the storage backend
    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout while communicating with storage backend")]
    Timeout,

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Invalid storage configuration: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Unknown storage error: {0}")]
    Unknown(String),
}

impl StorageError {
    pub fn not_found(bucket: &str, key: &str) -> Self {
        Self::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    /// Whether a redrive of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StorageError::Network(_) | StorageError::Timeout | StorageError::Unavailable(_)
        )
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;

    // Minimal store relying on the default copy implementation.
    struct MapStore {
        objects: Mutex<BTreeMap<(String, String), Bytes>>,
    }

    #[async_trait]
    impl ObjectStore for MapStore {
        async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
            self.objects
                .lock()
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
                .ok_or_else(|| StorageError::not_found(bucket, key))
        }

        async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StorageError> {
            self.objects
                .lock()
                .insert((bucket.to_string(), key.to_string()), body);
            Ok(())
        }

        async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
            self.objects
                .lock()
                .remove(&(bucket.to_string(), key.to_string()));
            Ok(())
        }

        async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
            Ok(self
                .objects
                .lock()
                .keys()
                .filter(|(b, k)| b == bucket && k.starts_with(prefix))
                .map(|(_, k)| k.clone())
                .collect())
        }
    }

    #[tokio::test]
    async fn test_default_copy_reads_then_writes() {
        let store = MapStore {
            objects: Mutex::new(BTreeMap::new()),
        };
        store.put("a", "src", Bytes::from_static(b"payload")).await.unwrap();

        store.copy("a", "src", "b", "dst").await.unwrap();

        assert_eq!(store.get("b", "dst").await.unwrap(), Bytes::from_static(b"payload"));
        // Source is untouched
        assert_eq!(store.get("a", "src").await.unwrap(), Bytes::from_static(b"payload"));
        assert_eq!(store.list("b", "").await.unwrap(), vec!["dst".to_string()]);

        store.delete("a", "src").await.unwrap();
        assert!(!store.exists("a", "src").await.unwrap());
        assert!(store.exists("b", "dst").await.unwrap());
    }

    #[tokio::test]
    async fn test_copy_missing_source_fails() {
        let store = MapStore {
            objects: Mutex::new(BTreeMap::new()),
        };
        let result = store.copy("a", "missing", "b", "dst").await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
        store.health_check().await.unwrap();
    }

    #[test]
    fn test_transient_classification() {
        assert!(StorageError::Timeout.is_transient());
        assert!(StorageError::Network("reset".into()).is_transient());
        assert!(!StorageError::not_found("b", "k").is_transient());
        assert!(!StorageError::PermissionDenied("no".into()).is_transient());
    }
}
