// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-Memory Object Store
//!
//! Process-local store used by tests and the `memory` backend. Records every
//! operation so tests can assert ordering, and supports injected failures
//! for exercising error paths.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

use crate::domain::storage::{ObjectStore, StorageError};

/// One recorded store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Get { bucket: String, key: String },
    Put { bucket: String, key: String },
    Copy { from: String, to: String },
    Delete { bucket: String, key: String },
    List { bucket: String, prefix: String },
}

#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), Bytes>>,
    ops: Mutex<Vec<StoreOp>>,
    /// Key prefix -> error message; writes (and copies into) a matching key fail
    failing_writes: Mutex<HashMap<String, String>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seed
    pub fn with_object(self, bucket: &str, key: &str, body: impl Into<Bytes>) -> Self {
        self.insert(bucket, key, body);
        self
    }

    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.objects
            .lock()
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    /// Read an object without recording an operation
    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Every key in a bucket, sorted
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }

    /// Make writes to keys starting with `key_prefix` fail.
    pub fn fail_writes_to(&self, key_prefix: &str, message: &str) {
        self.failing_writes
            .lock()
            .insert(key_prefix.to_string(), message.to_string());
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().clone()
    }

    fn record(&self, op: StoreOp) {
        self.ops.lock().push(op);
    }

    fn check_write(&self, key: &str) -> Result<(), StorageError> {
        let failing = self.failing_writes.lock();
        match failing.iter().find(|(prefix, _)| key.starts_with(prefix.as_str())) {
            Some((_, message)) => Err(StorageError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        self.record(StoreOp::Get {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        self.object(bucket, key)
            .ok_or_else(|| StorageError::not_found(bucket, key))
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StorageError> {
        self.record(StoreOp::Put {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        self.check_write(key)?;
        self.insert(bucket, key, body);
        Ok(())
    }

    async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<(), StorageError> {
        self.record(StoreOp::Copy {
            from: format!("{}/{}", src_bucket, src_key),
            to: format!("{}/{}", dst_bucket, dst_key),
        });
        self.check_write(dst_key)?;
        let body = self
            .object(src_bucket, src_key)
            .ok_or_else(|| StorageError::not_found(src_bucket, src_key))?;
        self.insert(dst_bucket, dst_key, body);
        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        Ok(self.object(bucket, key).is_some())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.record(StoreOp::Delete {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        self.objects
            .lock()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.record(StoreOp::List {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        });
        Ok(self
            .keys(bucket)
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ops_are_recorded_in_order() {
        let store = InMemoryObjectStore::new().with_object("a", "src", "body");

        store.copy("a", "src", "b", "dst").await.unwrap();
        store.get("b", "dst").await.unwrap();

        assert_eq!(
            store.ops(),
            vec![
                StoreOp::Copy {
                    from: "a/src".into(),
                    to: "b/dst".into()
                },
                StoreOp::Get {
                    bucket: "b".into(),
                    key: "dst".into()
                },
            ]
        );
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let store = InMemoryObjectStore::new();
        store.fail_writes_to("silver/", "throttled");

        store.put("arc", "bronze/x.json", Bytes::new()).await.unwrap();
        let err = store.put("arc", "silver/x.csv", Bytes::new()).await.unwrap_err();

        assert!(matches!(err, StorageError::Unavailable(ref m) if m == "throttled"));
        assert_eq!(store.keys("arc"), vec!["bronze/x.json".to_string()]);
    }
}
