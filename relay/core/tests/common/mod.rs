// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

#![allow(dead_code)]

use serde_json::{json, Value};

pub const STAGE: &str = "stage";
pub const ARCHIVE: &str = "audit-archive";

/// Notification body for `inference_id` owned by `owner`.
pub fn notification(inference_id: &str, status: &str, owner: &str) -> Value {
    json!({
        "awsRegion": "eu-west-2",
        "eventTime": "2025-04-01T10:15:30.123Z",
        "receivedTime": "2025-04-01T10:15:00.456Z",
        "invocationStatus": status,
        "requestParameters": {
            "accept": "*/*",
            "endpointName": "llm-endpoint",
            "inputLocation": input_uri(owner, inference_id)
        },
        "responseParameters": {
            "contentType": "application/json",
            "outputLocation": format!("https://results.example/out/{}.out", inference_id)
        },
        "responseBody": {
            "content": format!("{} failed: CUDA out of memory", inference_id)
        },
        "inferenceId": inference_id,
        "eventVersion": "1.0",
        "eventSource": "aws:sagemaker",
        "eventName": "InferenceResult"
    })
}

pub fn input_uri(owner: &str, inference_id: &str) -> String {
    format!("s3://{}/user/federated/{}/inputs/{}.json", STAGE, owner, inference_id)
}

pub fn input_key(owner: &str, inference_id: &str) -> String {
    format!("user/federated/{}/inputs/{}.json", owner, inference_id)
}

/// Transport envelope wrapping each message body as a string.
pub fn envelope(messages: &[Value]) -> Value {
    let records: Vec<Value> = messages
        .iter()
        .enumerate()
        .map(|(i, message)| {
            json!({
                "EventSource": "aws:sns",
                "EventVersion": "1.0",
                "EventSubscriptionArn": "arn:aws:sns:eu-west-2:123456789012:inference-done:sub",
                "Sns": {
                    "Type": "Notification",
                    "MessageId": format!("msg-{}", i),
                    "TopicArn": "arn:aws:sns:eu-west-2:123456789012:inference-done",
                    "Subject": null,
                    "Message": message.to_string(),
                    "Timestamp": "2025-04-01T10:15:31.000Z",
                    "MessageAttributes": {}
                }
            })
        })
        .collect();
    json!({ "Records": records })
}
