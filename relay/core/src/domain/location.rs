// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Object Locations
//!
//! Structured parsing of the storage URIs carried by inference notifications.
//! Input locations arrive as `s3://bucket/key`; output locations arrive as
//! fully-qualified HTTPS URLs in either virtual-hosted or path style.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Turns URI text into `(scheme, bucket, key)` with typed failures

use percent_encoding::percent_decode_str;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Key segments that precede the owning user's identifier.
pub const OWNER_MARKER: [&str; 2] = ["user", "federated"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Invalid object URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Unsupported URI scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("Object URI has no bucket: {0}")]
    MissingBucket(String),

    #[error("Object URI has no key: {0}")]
    MissingKey(String),

    #[error("Key '{0}' does not contain the user/federated marker")]
    MissingOwnerMarker(String),

    #[error("Key '{0}' has no user identifier after the user/federated marker")]
    MissingOwner(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    S3,
    Https,
    Http,
}

/// Identifier of the end user who submitted an inference job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FederatedUserId(String);

impl FederatedUserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FederatedUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single object in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    scheme: Scheme,
    bucket: String,
    key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::S3,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse an object URI.
    ///
    /// HTTPS hosts of the form `<bucket>.s3[.-]<region>.amazonaws.com` yield the
    /// prefix as bucket. `s3.<region>.amazonaws.com` is path style, where the
    /// first path segment is the bucket. Any other host is taken as the bucket.
    pub fn parse(uri: &str) -> Result<Self, LocationError> {
        let trimmed = uri.trim();
        let url = Url::parse(trimmed).map_err(|e| LocationError::InvalidUri {
            uri: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| LocationError::MissingBucket(trimmed.to_string()))?;

        let path = percent_decode_str(url.path().trim_start_matches('/'))
            .decode_utf8()
            .map_err(|e| LocationError::InvalidUri {
                uri: trimmed.to_string(),
                reason: e.to_string(),
            })?
            .into_owned();

        let (scheme, bucket, key) = match url.scheme() {
            "s3" => (Scheme::S3, host.to_string(), path),
            "https" => {
                let (bucket, key) = split_http_host(host, path);
                (Scheme::Https, bucket, key)
            }
            "http" => {
                let (bucket, key) = split_http_host(host, path);
                (Scheme::Http, bucket, key)
            }
            other => return Err(LocationError::UnsupportedScheme(other.to_string())),
        };

        if bucket.is_empty() {
            return Err(LocationError::MissingBucket(trimmed.to_string()));
        }
        if key.is_empty() {
            return Err(LocationError::MissingKey(trimmed.to_string()));
        }

        Ok(Self { scheme, bucket, key })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Same bucket, different key.
    pub fn sibling(&self, key: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::S3,
            bucket: self.bucket.clone(),
            key: key.into(),
        }
    }

    /// The user identifier in the first segment after `user/federated`.
    pub fn owner(&self) -> Result<FederatedUserId, LocationError> {
        let segments: Vec<&str> = self.key.split('/').collect();
        let marker = segments
            .windows(OWNER_MARKER.len())
            .position(|window| window == OWNER_MARKER)
            .ok_or_else(|| LocationError::MissingOwnerMarker(self.key.clone()))?;

        match segments.get(marker + OWNER_MARKER.len()) {
            Some(id) if !id.is_empty() => Ok(FederatedUserId::new(*id)),
            _ => Err(LocationError::MissingOwner(self.key.clone())),
        }
    }
}

fn split_http_host(host: &str, path: String) -> (String, String) {
    let path_style = host.ends_with(".amazonaws.com")
        && (host.starts_with("s3.") || host.starts_with("s3-"));
    if path_style {
        return match path.split_once('/') {
            Some((bucket, key)) => (bucket.to_string(), key.to_string()),
            None => (path, String::new()),
        };
    }

    match host.find(".s3.").or_else(|| host.find(".s3-")) {
        Some(idx) => (host[..idx].to_string(), path),
        None => (host.to_string(), path),
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

impl FromStr for ObjectLocation {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ObjectLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_s3_uri() {
        let loc = ObjectLocation::parse("s3://stage/user/federated/u42/in.json").unwrap();
        assert_eq!(loc.scheme(), Scheme::S3);
        assert_eq!(loc.bucket(), "stage");
        assert_eq!(loc.key(), "user/federated/u42/in.json");
        assert_eq!(loc.to_string(), "s3://stage/user/federated/u42/in.json");
    }

    #[test]
    fn test_parse_virtual_hosted_https() {
        let loc = ObjectLocation::parse(
            "https://results-bucket.s3.eu-west-2.amazonaws.com/out/nested/abc123.out",
        )
        .unwrap();
        assert_eq!(loc.scheme(), Scheme::Https);
        assert_eq!(loc.bucket(), "results-bucket");
        // The full path is the key, not only its first segment.
        assert_eq!(loc.key(), "out/nested/abc123.out");
    }

    #[test]
    fn test_parse_path_style_https() {
        let loc =
            ObjectLocation::parse("https://s3.eu-west-2.amazonaws.com/results/out/abc.out").unwrap();
        assert_eq!(loc.bucket(), "results");
        assert_eq!(loc.key(), "out/abc.out");
    }

    #[test]
    fn test_parse_plain_https_host_is_bucket() {
        let loc = ObjectLocation::parse("https://results.example/out/abc123.out").unwrap();
        assert_eq!(loc.bucket(), "results.example");
        assert_eq!(loc.key(), "out/abc123.out");
    }

    #[test]
    fn test_parse_percent_encoded_key() {
        let loc = ObjectLocation::parse("s3://stage/user/federated/u42/my%20file.json").unwrap();
        assert_eq!(loc.key(), "user/federated/u42/my file.json");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ObjectLocation::parse("not a uri"),
            Err(LocationError::InvalidUri { .. })
        ));
        assert!(matches!(
            ObjectLocation::parse("ftp://bucket/key"),
            Err(LocationError::UnsupportedScheme(s)) if s == "ftp"
        ));
        assert!(matches!(
            ObjectLocation::parse("s3://bucket"),
            Err(LocationError::MissingKey(_))
        ));
        assert!(matches!(
            ObjectLocation::parse("s3://bucket/"),
            Err(LocationError::MissingKey(_))
        ));
    }

    #[test]
    fn test_owner_extraction() {
        let loc = ObjectLocation::parse("s3://stage/user/federated/u42/in.json").unwrap();
        assert_eq!(loc.owner().unwrap(), FederatedUserId::new("u42"));

        let nested = ObjectLocation::new("stage", "tenant/a/user/federated/abc-def/x/y.json");
        assert_eq!(nested.owner().unwrap().as_str(), "abc-def");
    }

    #[test]
    fn test_owner_errors() {
        let no_marker = ObjectLocation::new("stage", "uploads/u42/in.json");
        assert!(matches!(
            no_marker.owner(),
            Err(LocationError::MissingOwnerMarker(_))
        ));

        let empty_owner = ObjectLocation::new("stage", "user/federated//in.json");
        assert!(matches!(empty_owner.owner(), Err(LocationError::MissingOwner(_))));

        let trailing = ObjectLocation::new("stage", "user/federated");
        assert!(matches!(trailing.owner(), Err(LocationError::MissingOwner(_))));
    }
}
