// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP invocation surface.
//!
//! Each endpoint takes one notification batch and runs one handler over it.
//! A non-2xx response means the batch was not fully processed and should be
//! redelivered.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::application::archiver::{ArchiveError, ArchiveReport, NotificationArchiver};
use crate::application::output_router::{MessageFailure, OutputRouter, RouterError, RouterReport};
use crate::domain::notification::EventBatch;
use crate::domain::storage::ObjectStore;

pub struct AppState {
    pub router: OutputRouter,
    pub archiver: NotificationArchiver,
    pub store: Arc<dyn ObjectStore>,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/invocations/route", post(route_batch))
        .route("/invocations/archive", post(archive_batch))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    failures: Option<Vec<MessageFailure>>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    failures: Option<Vec<MessageFailure>>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            failures: None,
        }
    }
}

/// Render an error with its source chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

impl From<RouterError> for ApiError {
    fn from(error: RouterError) -> Self {
        let message = error_chain(&error);
        let failures = match error {
            RouterError::Batch { failures, .. } => Some(failures),
            _ => None,
        };
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
            failures,
        }
    }
}

impl From<ArchiveError> for ApiError {
    fn from(error: ArchiveError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error_chain(&error))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
                failures: self.failures,
            }),
        )
            .into_response()
    }
}

fn parse_batch(body: &[u8]) -> Result<EventBatch, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Invalid notification batch: {}", e),
        )
    })
}

async fn route_batch(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RouterReport>, ApiError> {
    let batch = parse_batch(&body)?;
    let report = state.router.handle_batch(&batch).await?;
    Ok(Json(report))
}

async fn archive_batch(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ArchiveReport>, ApiError> {
    let batch = parse_batch(&body)?;
    let report = state.archiver.archive_batch(&batch).await?;
    Ok(Json(report))
}

async fn health(State(state): State<Arc<AppState>>) -> Response {
    match state.store.health_check().await {
        Ok(()) => Json(json!({"status": "ok"})).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "unavailable", "error": e.to_string()})),
        )
            .into_response(),
    }
}
