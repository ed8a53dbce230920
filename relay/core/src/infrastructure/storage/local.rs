// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Filesystem Object Store
//!
//! Filesystem-backed implementation of ObjectStore for single-node
//! development and offline runs of the CLI. Each bucket is a directory
//! under the root and each key is a relative path inside it.
//!
//! **Limitations:**
//! - No atomic replace (a crash mid-write can leave a partial object)
//! - Keys containing `..` segments or absolute paths are rejected

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::domain::storage::{ObjectStore, StorageError};

/// Local filesystem object store
pub struct LocalObjectStore {
    /// Root directory holding one subdirectory per bucket
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create new local object store, creating the root if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::IoError(format!(
                "Failed to create storage root {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        if bucket.is_empty() || bucket.contains('/') || bucket == "." || bucket == ".." {
            return Err(StorageError::InvalidKey(format!("invalid bucket name '{}'", bucket)));
        }
        Ok(self.root.join(bucket))
    }

    /// Resolve a key to a path inside the bucket directory
    fn resolve(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        if key.is_empty()
            || key.ends_with('/')
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.bucket_dir(bucket)?.join(relative))
    }
}

fn map_io(err: std::io::Error, bucket: &str, key: &str) -> StorageError {
    match err.kind() {
        std::io::ErrorKind::NotFound => StorageError::not_found(bucket, key),
        std::io::ErrorKind::PermissionDenied => {
            StorageError::PermissionDenied(format!("{}/{}: {}", bucket, key, err))
        }
        _ => StorageError::IoError(format!("{}/{}: {}", bucket, key, err)),
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        let path = self.resolve(bucket, key)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| map_io(e, bucket, key))?;
        Ok(Bytes::from(data))
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StorageError> {
        let path = self.resolve(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io(e, bucket, key))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .map_err(|e| map_io(e, bucket, key))?;

        tracing::debug!(bucket, key, bytes = body.len(), "Wrote local object");
        Ok(())
    }

    async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<(), StorageError> {
        let src = self.resolve(src_bucket, src_key)?;
        let dst = self.resolve(dst_bucket, dst_key)?;
        if let Some(parent) = dst.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io(e, dst_bucket, dst_key))?;
        }
        tokio::fs::copy(&src, &dst)
            .await
            .map_err(|e| map_io(e, src_bucket, src_key))?;
        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        let path = self.resolve(bucket, key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| map_io(e, bucket, key))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io(e, bucket, key)),
        }
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.bucket_dir(bucket)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let prefix = prefix.to_string();
        let keys = tokio::task::spawn_blocking(move || -> Result<Vec<String>, StorageError> {
            let mut keys = Vec::new();
            for entry in WalkDir::new(&dir) {
                let entry = entry.map_err(|e| StorageError::IoError(e.to_string()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(&dir) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(&prefix) {
                    keys.push(key);
                }
            }
            keys.sort();
            Ok(keys)
        })
        .await
        .map_err(|e| StorageError::Unknown(format!("listing task failed: {}", e)))??;

        Ok(keys)
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        let metadata = tokio::fs::metadata(&self.root).await?;
        if !metadata.is_dir() {
            return Err(StorageError::Unavailable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }
}
