// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Notification Archive Model
//!
//! Two-tier audit archive for inference notifications:
//! - **Bronze**: the verbatim inbound batch, one JSON object per batch
//! - **Silver**: one flattened CSV row per archivable notification
//!
//! Both tiers of a batch are keyed by the same [`LoadTimestamp`], which is the
//! join key between them.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use std::fmt;

use super::location::FederatedUserId;
use super::notification::{parse_event_time, DecodeError, InvocationStatus, Notification};

pub const BRONZE_PREFIX: &str = "bronze/sm_sns_messages";
pub const SILVER_PREFIX: &str = "silver/sm_sns_messages";

const COMPACT_FORMAT: &str = "%Y%m%d%H%M%S%6f";
const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f%:z";
const LOAD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Microsecond-precision load time shared by every row of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTimestamp(DateTime<Utc>);

impl LoadTimestamp {
    /// Truncates to whole microseconds.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self::from_micros(at.timestamp_micros())
    }

    pub fn from_micros(micros: i64) -> Self {
        Self(DateTime::<Utc>::UNIX_EPOCH + Duration::microseconds(micros))
    }

    pub fn as_micros(&self) -> i64 {
        self.0.timestamp_micros()
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.0.naive_utc()
    }

    /// `YYYYMMDDhhmmssffffff`
    pub fn compact(&self) -> String {
        self.0.format(COMPACT_FORMAT).to_string()
    }

    pub fn year(&self) -> String {
        self.compact()[..4].to_string()
    }

    pub fn month(&self) -> String {
        self.compact()[4..6].to_string()
    }
}

impl fmt::Display for LoadTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compact())
    }
}

pub fn bronze_key(load: &LoadTimestamp) -> String {
    format!(
        "{BRONZE_PREFIX}/{}/{}/{}_sm_sns_source.json",
        load.year(),
        load.month(),
        load.compact()
    )
}

pub fn silver_key(load: &LoadTimestamp) -> String {
    format!(
        "{SILVER_PREFIX}/{}/{}/{}_sm_sns_messages.csv",
        load.year(),
        load.month(),
        load.compact()
    )
}

/// Length of a payload in characters of its decoded text, as stored.
///
/// The text is not parsed and re-rendered, so whitespace and quoting in the
/// stored payload count toward the length.
pub fn payload_length(text: &str) -> usize {
    text.chars().count()
}

/// One silver row.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveRecord {
    pub inference_id: String,
    pub federated_user_id: FederatedUserId,
    pub invocation_status: InvocationStatus,
    pub event_time: DateTime<FixedOffset>,
    pub received_time: DateTime<FixedOffset>,
    pub endpoint_name: String,
    pub payload_length: usize,
    pub load_timestamp: LoadTimestamp,
}

impl ArchiveRecord {
    pub const COLUMNS: [&'static str; 8] = [
        "inference_id",
        "federated_user_id",
        "invocation_status",
        "event_time",
        "received_time",
        "endpoint_name",
        "payload_length",
        "load_timestamp",
    ];

    /// Build a row, requiring the endpoint name and both event times.
    pub fn from_notification(
        notification: &Notification,
        payload_length: usize,
        load_timestamp: LoadTimestamp,
    ) -> Result<Self, DecodeError> {
        let endpoint_name = notification
            .endpoint_name
            .clone()
            .ok_or(DecodeError::MissingField("requestParameters.endpointName"))?;

        Ok(Self {
            inference_id: notification.inference_id.clone(),
            federated_user_id: notification.owner.clone(),
            invocation_status: notification.invocation_status.clone(),
            event_time: parse_event_time(notification.event_time.as_deref(), "eventTime")?,
            received_time: parse_event_time(notification.received_time.as_deref(), "receivedTime")?,
            endpoint_name,
            payload_length,
            load_timestamp,
        })
    }

    /// Fields in [`Self::COLUMNS`] order.
    pub fn to_row(&self) -> [String; 8] {
        [
            self.inference_id.clone(),
            self.federated_user_id.to_string(),
            self.invocation_status.to_string(),
            self.event_time.format(EVENT_TIME_FORMAT).to_string(),
            self.received_time.format(EVENT_TIME_FORMAT).to_string(),
            self.endpoint_name.clone(),
            self.payload_length.to_string(),
            self.load_timestamp.naive().format(LOAD_TIME_FORMAT).to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn load() -> LoadTimestamp {
        let at = Utc.with_ymd_and_hms(2025, 4, 1, 9, 5, 7).unwrap() + Duration::microseconds(42);
        LoadTimestamp::from_datetime(at)
    }

    #[test]
    fn test_compact_rendering() {
        let ts = load();
        assert_eq!(ts.compact(), "20250401090507000042");
        assert_eq!(ts.compact().len(), 20);
        assert_eq!(ts.year(), "2025");
        assert_eq!(ts.month(), "04");
        assert_eq!(ts.to_string(), ts.compact());
    }

    #[test]
    fn test_micros_round_trip_truncates() {
        let at = Utc.with_ymd_and_hms(2025, 4, 1, 9, 5, 7).unwrap() + Duration::nanoseconds(1_999);
        let ts = LoadTimestamp::from_datetime(at);
        assert_eq!(LoadTimestamp::from_micros(ts.as_micros()), ts);
        assert!(ts.compact().ends_with("000001"));
    }

    #[test]
    fn test_archive_keys() {
        let ts = load();
        assert_eq!(
            bronze_key(&ts),
            "bronze/sm_sns_messages/2025/04/20250401090507000042_sm_sns_source.json"
        );
        assert_eq!(
            silver_key(&ts),
            "silver/sm_sns_messages/2025/04/20250401090507000042_sm_sns_messages.csv"
        );
    }

    #[test]
    fn test_payload_length_counts_characters() {
        assert_eq!(payload_length(r#"{"inputs": "hi"}"#), 16);
        // Multi-byte characters count once each.
        assert_eq!(payload_length("héllo ✓"), 7);
        assert_eq!("héllo ✓".len(), 10);
        // Formatting is counted as stored
        assert_eq!(payload_length("{\n  \"inputs\": \"hi\"\n}"), 20);
    }

    #[test]
    fn test_row_requires_archive_fields() {
        let notification = crate::domain::notification::decode_message(
            r#"{"inferenceId":"abc123","invocationStatus":"Completed","requestParameters":{"endpointName":"ep","inputLocation":"s3://stage/user/federated/u42/in.json"}}"#,
        )
        .unwrap();
        assert!(matches!(
            ArchiveRecord::from_notification(&notification, 1, load()),
            Err(DecodeError::MissingField("eventTime"))
        ));

        let mut notification = notification;
        notification.event_time = Some("2025-04-01T10:15:30.123Z".into());
        notification.received_time = Some("not a time".into());
        assert!(matches!(
            ArchiveRecord::from_notification(&notification, 1, load()),
            Err(DecodeError::InvalidTimestamp { field: "receivedTime", .. })
        ));

        notification.received_time = Some("2025-04-01T10:15:00Z".into());
        notification.endpoint_name = None;
        assert!(matches!(
            ArchiveRecord::from_notification(&notification, 1, load()),
            Err(DecodeError::MissingField("requestParameters.endpointName"))
        ));
    }

    #[test]
    fn test_row_rendering() {
        let record = ArchiveRecord {
            inference_id: "abc123".into(),
            federated_user_id: FederatedUserId::new("u42"),
            invocation_status: InvocationStatus::Completed,
            event_time: DateTime::parse_from_rfc3339("2025-04-01T10:15:30.123Z").unwrap(),
            received_time: DateTime::parse_from_rfc3339("2025-04-01T11:15:00.5+01:00").unwrap(),
            endpoint_name: "llm-endpoint".into(),
            payload_length: 16,
            load_timestamp: load(),
        };
        assert_eq!(
            record.to_row(),
            [
                "abc123".to_string(),
                "u42".to_string(),
                "Completed".to_string(),
                "2025-04-01 10:15:30.123000+00:00".to_string(),
                "2025-04-01 11:15:00.500000+01:00".to_string(),
                "llm-endpoint".to_string(),
                "16".to_string(),
                "2025-04-01 09:05:07.000042".to_string(),
            ]
        );
    }
}
