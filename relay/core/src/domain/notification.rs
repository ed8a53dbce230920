// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Inference Completion Notifications
//!
//! Wire types for the inbound event batch and the schema-validated decode of
//! each wrapped message body into a [`Notification`].
//!
//! The transport wraps every notification as an opaque string inside
//! `Records[].Sns.Message`. Unknown transport fields are preserved on the
//! wire types so that a batch serialises back to the same document.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Decouples transport encoding from the internal notification model

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

use super::literal::{self, LiteralError};
use super::location::{FederatedUserId, LocationError, ObjectLocation};

// ============================================================================
// Transport Envelope
// ============================================================================

/// One inbound invocation batch.
///
/// Only the `Records` array is required at this level. Each record stays an
/// untyped document until a handler reads its message, so one malformed
/// record never prevents the batch itself from being captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    #[serde(rename = "Records")]
    pub records: Vec<EventRecord>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One transport record, kept exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventRecord(Value);

impl EventBatch {
    /// Build a batch from bare message bodies.
    pub fn from_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            records: messages.into_iter().map(EventRecord::new).collect(),
            extra: Map::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EventRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self(json!({ "Sns": { "Message": message.into() } }))
    }

    pub fn from_value(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn message_id(&self) -> Option<&str> {
        self.0.get("Sns")?.get("MessageId")?.as_str()
    }

    /// The opaque notification body at `Sns.Message`.
    pub fn message(&self) -> Result<&str, DecodeError> {
        let message = self
            .0
            .get("Sns")
            .and_then(|sns| sns.get("Message"))
            .ok_or(DecodeError::MissingField("Sns.Message"))?;
        message.as_str().ok_or_else(|| DecodeError::InvalidField {
            field: "Sns.Message",
            reason: format!("expected a string, found {}", json_kind(message)),
        })
    }

    pub fn decode(&self) -> Result<Notification, DecodeError> {
        decode_message(self.message()?)
    }
}

// ============================================================================
// Notification
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InvocationStatus {
    Completed,
    Failed,
    Other(String),
}

impl InvocationStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "Completed" => Self::Completed,
            "Failed" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Other(other) => other,
        }
    }

    /// Only terminal outcomes enter the structured archive.
    pub fn is_archivable(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for InvocationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Outcome of one asynchronous inference invocation.
///
/// Only the fields needed to route are checked on decode. The endpoint name
/// and both event times are carried as received and validated by
/// [`parse_event_time`] when an archive row is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub inference_id: String,
    pub invocation_status: InvocationStatus,
    pub endpoint_name: Option<String>,
    pub input_location: ObjectLocation,
    pub owner: FederatedUserId,
    pub output_location: Option<ObjectLocation>,
    pub error_body: Option<Value>,
    pub event_time: Option<String>,
    pub received_time: Option<String>,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Message body is neither JSON nor a literal structure: {json}; {literal}")]
    Syntax {
        json: String,
        #[source]
        literal: LiteralError,
    },

    #[error("Message does not match the notification schema: {0}")]
    Schema(String),

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Invalid timestamp in '{field}': {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Invalid location in '{field}': {source}")]
    InvalidLocation {
        field: &'static str,
        #[source]
        source: LocationError,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationWire {
    inference_id: Option<String>,
    invocation_status: Option<String>,
    event_time: Option<String>,
    received_time: Option<String>,
    #[serde(default)]
    request_parameters: RequestParametersWire,
    #[serde(default)]
    response_parameters: ResponseParametersWire,
    #[serde(default)]
    response_body: ResponseBodyWire,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestParametersWire {
    endpoint_name: Option<String>,
    input_location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseParametersWire {
    output_location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseBodyWire {
    content: Option<Value>,
}

/// Decode one message body into a [`Notification`].
///
/// JSON is tried first; a body that is not JSON is normalised from its
/// literal-structure form and decoded against the same schema.
pub fn decode_message(body: &str) -> Result<Notification, DecodeError> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(json_err) => {
            let normalised = literal::to_json(body).map_err(|literal| DecodeError::Syntax {
                json: json_err.to_string(),
                literal,
            })?;
            serde_json::from_str(&normalised).map_err(|e| DecodeError::Schema(e.to_string()))?
        }
    };

    if !value.is_object() {
        return Err(DecodeError::Schema(format!(
            "expected an object, found {}",
            json_kind(&value)
        )));
    }

    let wire: NotificationWire =
        serde_json::from_value(value).map_err(|e| DecodeError::Schema(e.to_string()))?;
    Notification::from_wire(wire)
}

impl Notification {
    fn from_wire(wire: NotificationWire) -> Result<Self, DecodeError> {
        let inference_id = required(wire.inference_id, "inferenceId")?;
        if inference_id.contains('/') {
            return Err(DecodeError::InvalidField {
                field: "inferenceId",
                reason: format!("'{}' contains a path separator", inference_id),
            });
        }

        let invocation_status =
            InvocationStatus::parse(&required(wire.invocation_status, "invocationStatus")?);
        let input_uri = required(
            wire.request_parameters.input_location,
            "requestParameters.inputLocation",
        )?;
        let input_location = location(&input_uri, "requestParameters.inputLocation")?;
        let owner = input_location
            .owner()
            .map_err(|source| DecodeError::InvalidLocation {
                field: "requestParameters.inputLocation",
                source,
            })?;

        let output_location = wire
            .response_parameters
            .output_location
            .filter(|uri| !uri.trim().is_empty())
            .map(|uri| location(&uri, "responseParameters.outputLocation"))
            .transpose()?;

        Ok(Self {
            inference_id,
            invocation_status,
            endpoint_name: present(wire.request_parameters.endpoint_name),
            input_location,
            owner,
            output_location,
            error_body: wire.response_body.content,
            event_time: present(wire.event_time),
            received_time: present(wire.received_time),
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, field: &'static str) -> Result<String, DecodeError> {
    present(value).ok_or(DecodeError::MissingField(field))
}

fn location(uri: &str, field: &'static str) -> Result<ObjectLocation, DecodeError> {
    ObjectLocation::parse(uri).map_err(|source| DecodeError::InvalidLocation { field, source })
}

/// Parse a required RFC 3339 event time.
pub fn parse_event_time(
    value: Option<&str>,
    field: &'static str,
) -> Result<DateTime<FixedOffset>, DecodeError> {
    let raw = required(value.map(str::to_string), field)?;
    DateTime::parse_from_rfc3339(&raw).map_err(|_| DecodeError::InvalidTimestamp { field, value: raw })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
