// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Output Routing Rules
//!
//! Pure decision logic: given a notification, where does its deliverable go?
//! No I/O happens here; the router service executes the plan.
//!
//! Successful outputs are renamed to `{inference_id}.out` under the owner's
//! area so that the destination is stable regardless of the key the
//! inference service chose.

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

use super::location::{FederatedUserId, ObjectLocation};
use super::notification::{InvocationStatus, Notification};

pub const USER_AREA_PREFIX: &str = "user/federated";

/// Key for a successful inference output in the owner's area.
pub fn output_key(owner: &FederatedUserId, inference_id: &str) -> String {
    format!("{USER_AREA_PREFIX}/{owner}/sagemaker/outputs/{inference_id}.out")
}

/// Key for a failed inference's error payload in the owner's area.
pub fn error_key(owner: &FederatedUserId, inference_id: &str) -> String {
    format!("{USER_AREA_PREFIX}/{owner}/sagemaker/errors/{inference_id}.out")
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoutingPlan {
    /// Copy the result object into the owner's outputs.
    CopyOutput {
        source: ObjectLocation,
        destination: ObjectLocation,
    },
    /// Store the error payload in the owner's errors.
    WriteError {
        destination: ObjectLocation,
        body: Bytes,
    },
    /// Status is neither Completed nor Failed.
    Skip { status: InvocationStatus },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("Completed inference {inference_id} has no output location")]
    MissingOutputLocation { inference_id: String },

    #[error("Failed inference {inference_id} has no error body")]
    MissingErrorBody { inference_id: String },
}

/// Decide what to do with one notification.
///
/// The staging bucket is the bucket that holds the input payload; both
/// outputs and errors land there under the owner's area.
pub fn plan_route(notification: &Notification) -> Result<RoutingPlan, RoutingError> {
    let staging = &notification.input_location;
    let owner = &notification.owner;
    let inference_id = &notification.inference_id;

    match &notification.invocation_status {
        InvocationStatus::Completed => {
            let source = notification.output_location.clone().ok_or_else(|| {
                RoutingError::MissingOutputLocation {
                    inference_id: inference_id.clone(),
                }
            })?;
            Ok(RoutingPlan::CopyOutput {
                source,
                destination: staging.sibling(output_key(owner, inference_id)),
            })
        }
        InvocationStatus::Failed => {
            let body = notification.error_body.as_ref().ok_or_else(|| {
                RoutingError::MissingErrorBody {
                    inference_id: inference_id.clone(),
                }
            })?;
            Ok(RoutingPlan::WriteError {
                destination: staging.sibling(error_key(owner, inference_id)),
                body: render_error_body(body),
            })
        }
        other => Ok(RoutingPlan::Skip {
            status: other.clone(),
        }),
    }
}

/// Serialised form of an error payload: text verbatim, anything else as
/// compact JSON.
pub fn render_error_body(body: &Value) -> Bytes {
    match body {
        Value::String(text) => Bytes::from(text.clone()),
        other => Bytes::from(other.to_string()),
    }
}
