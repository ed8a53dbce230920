// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Output Router Application Service
//!
//! Moves the deliverable of each finished inference into the area owned by
//! the user who submitted it:
//! - `Completed` copies the result object into `.../sagemaker/outputs/`
//! - `Failed` writes the error payload into `.../sagemaker/errors/`
//! - any other status is logged and skipped
//!
//! Batches are handled with per-message isolation. Every record is attempted
//! in arrival order; if any failed, the batch as a whole fails afterwards
//! with the collected failures so the invoking environment redrives it.
//! Redelivery of an already routed message overwrites the same key.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::location::ObjectLocation;
use crate::domain::notification::{DecodeError, EventBatch, EventRecord, InvocationStatus, Notification};
use crate::domain::routing::{plan_route, RoutingError, RoutingPlan};
use crate::domain::storage::{ObjectStore, StorageError};
use crate::metrics;

// ============================================================================
// Results
// ============================================================================

/// What happened to one notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteOutcome {
    Copied {
        inference_id: String,
        source: ObjectLocation,
        destination: ObjectLocation,
    },
    ErrorStored {
        inference_id: String,
        destination: ObjectLocation,
        bytes: usize,
    },
    Skipped {
        inference_id: String,
        status: InvocationStatus,
    },
}

impl RouteOutcome {
    pub fn inference_id(&self) -> &str {
        match self {
            Self::Copied { inference_id, .. }
            | Self::ErrorStored { inference_id, .. }
            | Self::Skipped { inference_id, .. } => inference_id,
        }
    }

    /// Destination written, if any
    pub fn destination(&self) -> Option<&ObjectLocation> {
        match self {
            Self::Copied { destination, .. } | Self::ErrorStored { destination, .. } => {
                Some(destination)
            }
            Self::Skipped { .. } => None,
        }
    }
}

/// Summary of a fully successful batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouterReport {
    pub total: usize,
    pub outcomes: Vec<RouteOutcome>,
}

impl RouterReport {
    pub fn copied(&self) -> usize {
        self.count(|o| matches!(o, RouteOutcome::Copied { .. }))
    }

    pub fn errors_stored(&self) -> usize {
        self.count(|o| matches!(o, RouteOutcome::ErrorStored { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RouteOutcome::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&RouteOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// One failed record inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageFailure {
    /// Position of the record in the batch
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_id: Option<String>,
    /// Whether a redrive may succeed without changing the message
    pub transient: bool,
    pub error: String,
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Failed to decode notification: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("Storage {operation} failed for {location}: {source}")]
    Storage {
        operation: &'static str,
        location: ObjectLocation,
        #[source]
        source: StorageError,
    },

    #[error("{failed} of {total} notifications failed to route")]
    Batch {
        failed: usize,
        total: usize,
        failures: Vec<MessageFailure>,
    },
}

impl RouterError {
    fn stage(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Routing(_) => "routing",
            Self::Storage { .. } | Self::Batch { .. } => "storage",
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage { source, .. } => source.is_transient(),
            Self::Batch { failures, .. } => failures.iter().all(|f| f.transient),
            Self::Decode(_) | Self::Routing(_) => false,
        }
    }
}

// ============================================================================
// Service
// ============================================================================

pub struct OutputRouter {
    store: Arc<dyn ObjectStore>,
}

impl OutputRouter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Route one decoded notification.
    #[instrument(
        skip(self, notification),
        fields(
            inference_id = %notification.inference_id,
            invocation_status = %notification.invocation_status,
            owner = %notification.owner,
        )
    )]
    pub async fn route(&self, notification: &Notification) -> Result<RouteOutcome, RouterError> {
        let inference_id = notification.inference_id.clone();

        match plan_route(notification)? {
            RoutingPlan::CopyOutput {
                source,
                destination,
            } => {
                self.store
                    .copy(
                        source.bucket(),
                        source.key(),
                        destination.bucket(),
                        destination.key(),
                    )
                    .await
                    .map_err(|e| RouterError::Storage {
                        operation: "copy",
                        location: source.clone(),
                        source: e,
                    })?;

                info!(%source, %destination, "Copied inference output to user area");
                metrics::record_routed("output");
                Ok(RouteOutcome::Copied {
                    inference_id,
                    source,
                    destination,
                })
            }
            RoutingPlan::WriteError { destination, body } => {
                let bytes = body.len();
                self.store
                    .put(destination.bucket(), destination.key(), body)
                    .await
                    .map_err(|e| RouterError::Storage {
                        operation: "put",
                        location: destination.clone(),
                        source: e,
                    })?;

                info!(%destination, bytes, "Stored inference error payload in user area");
                metrics::record_routed("error");
                Ok(RouteOutcome::ErrorStored {
                    inference_id,
                    destination,
                    bytes,
                })
            }
            RoutingPlan::Skip { status } => {
                warn!("Skipping notification with unexpected invocation status");
                metrics::record_route_skipped(status.as_str());
                Ok(RouteOutcome::Skipped {
                    inference_id,
                    status,
                })
            }
        }
    }

    /// Decode and route one transport record.
    pub async fn handle_record(&self, record: &EventRecord) -> Result<RouteOutcome, RouterError> {
        self.attempt(record).await.1
    }

    /// Route one record, returning its inference id when it decoded.
    async fn attempt(
        &self,
        record: &EventRecord,
    ) -> (Option<String>, Result<RouteOutcome, RouterError>) {
        let notification = match record.decode() {
            Ok(notification) => notification,
            Err(e) => return (None, Err(e.into())),
        };
        let result = self.route(&notification).await;
        (Some(notification.inference_id), result)
    }

    /// Route every record of a batch in arrival order.
    pub async fn handle_batch(&self, batch: &EventBatch) -> Result<RouterReport, RouterError> {
        let started = Instant::now();
        let total = batch.len();
        let mut report = RouterReport {
            total,
            outcomes: Vec::with_capacity(total),
        };
        let mut failures = Vec::new();

        debug!(total, "Routing notification batch");

        for (index, record) in batch.records.iter().enumerate() {
            let (inference_id, result) = self.attempt(record).await;
            match result {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    metrics::record_route_failure(e.stage());
                    error!(
                        index,
                        message_id = record.message_id(),
                        inference_id = inference_id.as_deref(),
                        error = %e,
                        "Failed to route notification"
                    );
                    failures.push(MessageFailure {
                        index,
                        message_id: record.message_id().map(str::to_string),
                        inference_id,
                        transient: e.is_transient(),
                        error: e.to_string(),
                    });
                }
            }
        }

        metrics::record_batch_duration("route", started.elapsed().as_secs_f64());

        if failures.is_empty() {
            info!(
                total,
                copied = report.copied(),
                errors_stored = report.errors_stored(),
                skipped = report.skipped(),
                "Routed notification batch"
            );
            Ok(report)
        } else {
            Err(RouterError::Batch {
                failed: failures.len(),
                total,
                failures,
            })
        }
    }
}
