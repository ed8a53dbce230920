// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! S3 Object Store
//!
//! S3-backed implementation of ObjectStore built on OpenDAL. One operator is
//! built lazily per bucket and cached for the life of the process.
//!
//! Credentials and region resolve from the standard AWS environment
//! (`AWS_ACCESS_KEY_ID`, `AWS_REGION`, instance profile) unless the relay
//! configuration sets an explicit region or endpoint.

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{services::S3, ErrorKind, Operator};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::domain::storage::{ObjectStore, StorageError};

pub struct S3ObjectStore {
    region: Option<String>,
    endpoint: Option<String>,
    operators: RwLock<HashMap<String, Operator>>,
}

impl S3ObjectStore {
    pub fn new(region: Option<String>, endpoint: Option<String>) -> Self {
        Self {
            region,
            endpoint,
            operators: RwLock::new(HashMap::new()),
        }
    }

    fn operator(&self, bucket: &str) -> Result<Operator, StorageError> {
        if let Some(op) = self.operators.read().get(bucket) {
            return Ok(op.clone());
        }

        let mut builder = S3::default().bucket(bucket);
        if let Some(region) = &self.region {
            builder = builder.region(region);
        }
        if let Some(endpoint) = &self.endpoint {
            builder = builder.endpoint(endpoint);
        }

        let op = Operator::new(builder)
            .map_err(|e| StorageError::Configuration(format!("bucket {}: {}", bucket, e)))?
            .finish();

        tracing::debug!(bucket, "Created S3 operator");
        self.operators
            .write()
            .insert(bucket.to_string(), op.clone());
        Ok(op)
    }
}

fn map_error(err: opendal::Error, bucket: &str, key: &str) -> StorageError {
    match err.kind() {
        ErrorKind::NotFound => StorageError::not_found(bucket, key),
        ErrorKind::PermissionDenied => {
            StorageError::PermissionDenied(format!("{}/{}: {}", bucket, key, err))
        }
        ErrorKind::ConfigInvalid => StorageError::Configuration(err.to_string()),
        ErrorKind::RateLimited => StorageError::Unavailable(err.to_string()),
        _ if err.is_temporary() => StorageError::Network(err.to_string()),
        _ => StorageError::Unknown(err.to_string()),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        let buffer = self
            .operator(bucket)?
            .read(key)
            .await
            .map_err(|e| map_error(e, bucket, key))?;
        Ok(buffer.to_bytes())
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StorageError> {
        let size = body.len();
        self.operator(bucket)?
            .write(key, body)
            .await
            .map_err(|e| map_error(e, bucket, key))?;

        tracing::debug!(bucket, key, bytes = size, "Wrote S3 object");
        Ok(())
    }

    async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<(), StorageError> {
        if src_bucket == dst_bucket {
            return self
                .operator(src_bucket)?
                .copy(src_key, dst_key)
                .await
                .map_err(|e| map_error(e, src_bucket, src_key));
        }

        // Operators are bucket-scoped, so cross-bucket copies go through memory
        let body = self.get(src_bucket, src_key).await?;
        self.put(dst_bucket, dst_key, body).await
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        self.operator(bucket)?
            .exists(key)
            .await
            .map_err(|e| map_error(e, bucket, key))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.operator(bucket)?
            .delete(key)
            .await
            .map_err(|e| map_error(e, bucket, key))
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let entries = self
            .operator(bucket)?
            .list_with(prefix)
            .recursive(true)
            .await
            .map_err(|e| map_error(e, bucket, prefix))?;

        let mut keys: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.metadata().is_file())
            .map(|entry| entry.path().to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
