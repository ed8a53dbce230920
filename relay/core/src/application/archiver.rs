// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Notification Archiver Application Service
//!
//! Builds the two-tier audit trail for every inbound notification batch:
//!
//! 1. Issue one [`LoadTimestamp`] for the batch
//! 2. Capture the batch verbatim to the bronze tier
//! 3. Extract one [`ArchiveRecord`] per `Completed`/`Failed` notification,
//!    measuring the input payload length through a scratch download
//! 4. Accumulate rows in arrival order in a scratch CSV
//! 5. Upload the CSV to the silver tier under the same load timestamp
//!
//! Bronze is written before any per-message work and is never rolled back:
//! a record failure aborts the batch but leaves the raw capture in place.
//! Scratch files are guards, so none outlive the call on any path.

use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::archive::{bronze_key, payload_length, silver_key, ArchiveRecord, LoadTimestamp};
use crate::domain::notification::{DecodeError, EventBatch, EventRecord};
use crate::domain::storage::{ObjectStore, StorageError};
use crate::infrastructure::clock::LoadClock;
use crate::infrastructure::scratch::{ScratchFile, ScratchSpace};
use crate::metrics;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to serialize batch: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Scratch file error: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("Failed to write silver rows: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to upload {tier} object {bucket}/{key}: {source}")]
    Upload {
        tier: &'static str,
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Record {index} could not be archived: {source}")]
    Record {
        index: usize,
        #[source]
        source: RecordError,
    },
}

impl ArchiveError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Upload { source, .. } => source.is_transient(),
            Self::Record {
                source: RecordError::PayloadLookup { source, .. },
                ..
            } => source.is_transient(),
            _ => false,
        }
    }
}

/// Failure extracting one archive row.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Input payload lookup failed for {bucket}/{key}: {source}")]
    PayloadLookup {
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Input payload {bucket}/{key} is not valid UTF-8 text")]
    PayloadNotText { bucket: String, key: String },

    #[error("Scratch file error: {0}")]
    Scratch(#[from] std::io::Error),
}

// ============================================================================
// Report
// ============================================================================

/// Result of one archived batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveReport {
    pub load_timestamp: String,
    pub bucket: String,
    pub bronze_key: String,
    pub silver_key: String,
    /// Rows written to silver
    pub rows: usize,
    /// Notifications excluded for an unexpected status
    pub skipped: usize,
    pub total: usize,
}

// ============================================================================
// Service
// ============================================================================

pub struct NotificationArchiver {
    store: Arc<dyn ObjectStore>,
    archive_bucket: String,
    scratch: ScratchSpace,
    clock: Arc<LoadClock>,
}

impl NotificationArchiver {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        archive_bucket: impl Into<String>,
        scratch: ScratchSpace,
        clock: Arc<LoadClock>,
    ) -> Self {
        Self {
            store,
            archive_bucket: archive_bucket.into(),
            scratch,
            clock,
        }
    }

    pub fn archive_bucket(&self) -> &str {
        &self.archive_bucket
    }

    /// Archive one batch to bronze and silver.
    pub async fn archive_batch(&self, batch: &EventBatch) -> Result<ArchiveReport, ArchiveError> {
        let started = Instant::now();
        let load = self.clock.next();

        let result = self.run(batch, load).await;
        metrics::record_batch_duration("archive", started.elapsed().as_secs_f64());

        match &result {
            Ok(report) => {
                metrics::record_archive(report.rows as u64, report.skipped as u64);
                info!(
                    load_timestamp = %report.load_timestamp,
                    rows = report.rows,
                    skipped = report.skipped,
                    total = report.total,
                    "Archived notification batch"
                );
            }
            Err(e) => {
                metrics::record_archive_failure();
                error!(load_timestamp = %load, error = %e, "Failed to archive notification batch");
            }
        }
        result
    }

    async fn run(&self, batch: &EventBatch, load: LoadTimestamp) -> Result<ArchiveReport, ArchiveError> {
        let bronze = bronze_key(&load);
        let silver = silver_key(&load);

        // Bronze: raw capture first, so it survives any later failure
        let raw = serde_json::to_vec(batch)?;
        let body = self.stage("bronze", ".json", &raw)?;
        self.upload("bronze", &bronze, body).await?;
        debug!(key = %bronze, records = batch.len(), "Captured bronze batch");

        // Per message, in arrival order
        let mut csv_file = self
            .scratch
            .create("relay-silver-", ".csv")
            .map_err(ArchiveError::Scratch)?;
        let mut rows = 0usize;
        let mut skipped = 0usize;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(csv_file.writer());

            for (index, record) in batch.records.iter().enumerate() {
                match self.extract(record, load).await {
                    Ok(Some(row)) => {
                        writer.write_record(row.to_row())?;
                        rows += 1;
                    }
                    Ok(None) => skipped += 1,
                    Err(source) => return Err(ArchiveError::Record { index, source }),
                }
            }
            writer.flush().map_err(ArchiveError::Scratch)?;
        }

        // Silver: uploaded even when no row qualified
        let csv_body = csv_file.read_all().map_err(ArchiveError::Scratch)?;
        drop(csv_file);
        self.upload("silver", &silver, Bytes::from(csv_body)).await?;

        Ok(ArchiveReport {
            load_timestamp: load.compact(),
            bucket: self.archive_bucket.clone(),
            bronze_key: bronze,
            silver_key: silver,
            rows,
            skipped,
            total: batch.len(),
        })
    }

    /// One silver row, or `None` for a status outside the archive.
    async fn extract(
        &self,
        record: &EventRecord,
        load: LoadTimestamp,
    ) -> Result<Option<ArchiveRecord>, RecordError> {
        let notification = record.decode()?;

        if !notification.invocation_status.is_archivable() {
            warn!(
                inference_id = %notification.inference_id,
                invocation_status = %notification.invocation_status,
                "Unexpected invocation status; excluding from silver archive"
            );
            return Ok(None);
        }

        // Row fields are checked before any payload I/O
        let mut row = ArchiveRecord::from_notification(&notification, 0, load)?;
        let input = &notification.input_location;
        row.payload_length = self.measure_payload(input.bucket(), input.key()).await?;

        Ok(Some(row))
    }

    /// Download the input payload to scratch and count its characters.
    async fn measure_payload(&self, bucket: &str, key: &str) -> Result<usize, RecordError> {
        let body = self
            .store
            .get(bucket, key)
            .await
            .map_err(|source| RecordError::PayloadLookup {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            })?;

        let mut file = self.scratch.create("relay-payload-", ".dat")?;
        file.write_all(&body)?;
        let content = file.read_all()?;

        let text = String::from_utf8(content).map_err(|_| RecordError::PayloadNotText {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;
        Ok(payload_length(&text))
    }

    /// Write a body to scratch and read it back as the upload payload.
    fn stage(&self, tier: &str, suffix: &str, data: &[u8]) -> Result<Bytes, ArchiveError> {
        let mut file: ScratchFile = self
            .scratch
            .create(&format!("relay-{}-", tier), suffix)
            .map_err(ArchiveError::Scratch)?;
        file.write_all(data).map_err(ArchiveError::Scratch)?;
        let staged = file.read_all().map_err(ArchiveError::Scratch)?;
        Ok(Bytes::from(staged))
    }

    async fn upload(&self, tier: &'static str, key: &str, body: Bytes) -> Result<(), ArchiveError> {
        self.store
            .put(&self.archive_bucket, key, body)
            .await
            .map_err(|source| ArchiveError::Upload {
                tier,
                bucket: self.archive_bucket.clone(),
                key: key.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryObjectStore;

    #[tokio::test]
    async fn test_empty_batch_writes_both_tiers() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = Arc::new(InMemoryObjectStore::new());
        let archiver = NotificationArchiver::new(
            store.clone(),
            "archive",
            ScratchSpace::new(tmp.path()),
            Arc::new(LoadClock::with_source(|| 1_743_498_307_000_042)),
        );

        let report = archiver
            .archive_batch(&EventBatch::from_messages(Vec::<String>::new()))
            .await
            .unwrap();

        assert_eq!(report.rows, 0);
        assert_eq!(report.load_timestamp, "20250401090507000042");
        assert_eq!(store.object("archive", &report.silver_key), Some(Bytes::new()));
        assert_eq!(
            store.object("archive", &report.bronze_key),
            Some(Bytes::from_static(br#"{"Records":[]}"#))
        );
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_transient_classification() {
        let err = ArchiveError::Upload {
            tier: "silver",
            bucket: "b".into(),
            key: "k".into(),
            source: StorageError::Timeout,
        };
        assert!(err.is_transient());

        let err = ArchiveError::Record {
            index: 0,
            source: RecordError::PayloadNotText {
                bucket: "b".into(),
                key: "k".into(),
            },
        };
        assert!(!err.is_transient());
    }
}
