// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Storage Infrastructure Module
//!
//! Provides concrete implementations of the ObjectStore trait:
//! - [`S3ObjectStore`] for production buckets
//! - [`LocalObjectStore`] for development and offline CLI runs
//! - [`InMemoryObjectStore`] for tests

pub mod local;
pub mod memory;
pub mod s3;

pub use local::LocalObjectStore;
pub use memory::{InMemoryObjectStore, StoreOp};
pub use s3::S3ObjectStore;

use std::sync::Arc;

use crate::domain::config::{StorageBackendKind, StorageConfig};
use crate::domain::storage::{ObjectStore, StorageError};

/// Factory function to create an object store from configuration
pub fn create_object_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match config.backend {
        StorageBackendKind::S3 => Ok(Arc::new(S3ObjectStore::new(
            config.region.clone(),
            config.endpoint.clone(),
        ))),
        StorageBackendKind::Local => {
            let root = config.local_root.clone().ok_or_else(|| {
                StorageError::Configuration("local backend requires storage.local_root".to_string())
            })?;
            Ok(Arc::new(LocalObjectStore::new(root)?))
        }
        StorageBackendKind::Memory => {
            tracing::warn!("Using in-memory object store; objects are lost on exit");
            Ok(Arc::new(InMemoryObjectStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_factory_local() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackendKind::Local,
            local_root: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };

        let store = create_object_store(&config).unwrap();
        store.put("b", "k", Bytes::from_static(b"v")).await.unwrap();
        assert!(temp_dir.path().join("b").join("k").exists());
    }

    #[test]
    fn test_factory_local_requires_root() {
        let config = StorageConfig {
            backend: StorageBackendKind::Local,
            ..Default::default()
        };
        assert!(matches!(
            create_object_store(&config),
            Err(StorageError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_factory_memory() {
        let config = StorageConfig {
            backend: StorageBackendKind::Memory,
            ..Default::default()
        };
        let store = create_object_store(&config).unwrap();
        store.health_check().await.unwrap();
        assert!(store.list("any", "").await.unwrap().is_empty());
    }
}
