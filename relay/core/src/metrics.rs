// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Relay metrics.
//!
//! Counters and histograms for routing and archiving. These complement the
//! structured logging emitted by the handlers.

use metrics::{counter, describe_counter, describe_histogram, histogram};

// ============================================================================
// Router Metrics
// ============================================================================

/// Notifications delivered into a user area.
pub const ROUTED: &str = "relay_router_routed_total";

/// Notifications with a status the router does not act on.
pub const ROUTE_SKIPPED: &str = "relay_router_skipped_total";

/// Notifications that failed to decode or deliver.
pub const ROUTE_FAILURES: &str = "relay_router_failures_total";

// ============================================================================
// Archive Metrics
// ============================================================================

/// Batches captured to the bronze tier.
pub const ARCHIVE_BATCHES: &str = "relay_archive_batches_total";

/// Rows written to the silver tier.
pub const ARCHIVE_ROWS: &str = "relay_archive_rows_total";

/// Notifications excluded from the silver tier.
pub const ARCHIVE_SKIPPED: &str = "relay_archive_skipped_total";

/// Archive batches that failed.
pub const ARCHIVE_FAILURES: &str = "relay_archive_failures_total";

/// Handler duration histogram, labelled by handler.
pub const BATCH_DURATION: &str = "relay_batch_duration_seconds";

// ============================================================================
// Metric Registration
// ============================================================================

/// Registers all relay metric descriptions.
///
/// Call this once at application startup after initializing the metrics recorder.
pub fn register_metrics() {
    describe_counter!(ROUTED, "Total notifications routed into user areas");
    describe_counter!(ROUTE_SKIPPED, "Total notifications skipped by the router");
    describe_counter!(ROUTE_FAILURES, "Total notifications the router failed to handle");
    describe_counter!(ARCHIVE_BATCHES, "Total batches captured to bronze");
    describe_counter!(ARCHIVE_ROWS, "Total rows written to silver");
    describe_counter!(ARCHIVE_SKIPPED, "Total notifications excluded from silver");
    describe_counter!(ARCHIVE_FAILURES, "Total archive batch failures");
    describe_histogram!(BATCH_DURATION, "Duration of batch handling in seconds");
}

// ============================================================================
// Recording
// ============================================================================

/// Records a delivered notification; `kind` is `output` or `error`.
pub fn record_routed(kind: &'static str) {
    counter!(ROUTED, "kind" => kind).increment(1);
}

pub fn record_route_skipped(status: &str) {
    counter!(ROUTE_SKIPPED, "status" => status.to_string()).increment(1);
}

/// Records a router failure; `stage` is `decode`, `routing` or `storage`.
pub fn record_route_failure(stage: &'static str) {
    counter!(ROUTE_FAILURES, "stage" => stage).increment(1);
}

pub fn record_archive(rows: u64, skipped: u64) {
    counter!(ARCHIVE_BATCHES).increment(1);
    counter!(ARCHIVE_ROWS).increment(rows);
    counter!(ARCHIVE_SKIPPED).increment(skipped);
}

pub fn record_archive_failure() {
    counter!(ARCHIVE_FAILURES).increment(1);
}

pub fn record_batch_duration(handler: &'static str, duration_secs: f64) {
    histogram!(BATCH_DURATION, "handler" => handler).record(duration_secs);
}
