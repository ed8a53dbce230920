// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Relay Configuration
//
// Loaded once at process start and treated as immutable afterwards:
// - Archive bucket for bronze/silver captures
// - Object storage backend selection
// - Scratch directory for per-invocation temp files
// - HTTP invocation surface and observability settings
//
// Sources in increasing precedence: built-in defaults, YAML file, environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "RELAY_CONFIG_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub archive: ArchiveConfig,
    pub storage: StorageConfig,
    pub scratch: ScratchConfig,
    pub server: ServerConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Bucket receiving bronze and silver objects
    pub bucket: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    S3,
    Local,
    Memory,
}

impl std::str::FromStr for StorageBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "local" => Ok(Self::Local),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,

    /// Region for the S3 backend (falls back to the SDK environment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Root directory for the local backend; each bucket is a subdirectory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    /// Scratch directory (default: OS temp dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log format (compact, json)
    pub log_format: String,

    /// Prometheus exporter port; disabled when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics_port: None,
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl RelayConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Discover configuration file using precedence order
    /// 1. RELAY_CONFIG_PATH environment variable
    /// 2. ./relay-config.yaml (working directory)
    /// 3. ~/.inference-relay/config.yaml (user home)
    /// 4. /etc/inference-relay/config.yaml
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./relay-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".inference-relay").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/inference-relay/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?
        } else if let Some(path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", path);
            Self::from_yaml_file(path)?
        } else {
            tracing::debug!("No configuration file found, using defaults and environment");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// `ARCHIVE_BUCKET` takes precedence over the legacy `S3_BUCKET_NAME`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(bucket) = non_empty("ARCHIVE_BUCKET").or_else(|| non_empty("S3_BUCKET_NAME")) {
            self.archive.bucket = bucket;
        }

        if let Some(val) = non_empty("RELAY_STORAGE_BACKEND") {
            match val.parse() {
                Ok(kind) => self.storage.backend = kind,
                Err(e) => tracing::warn!("Ignoring RELAY_STORAGE_BACKEND: {}", e),
            }
        }

        // AWS_REGION only fills a region the file left unset
        if let Some(region) = non_empty("RELAY_STORAGE_REGION") {
            self.storage.region = Some(region);
        } else if self.storage.region.is_none() {
            self.storage.region = non_empty("AWS_REGION");
        }

        if let Some(endpoint) = non_empty("RELAY_STORAGE_ENDPOINT") {
            self.storage.endpoint = Some(endpoint);
        }

        if let Some(root) = non_empty("RELAY_LOCAL_ROOT") {
            self.storage.local_root = Some(PathBuf::from(root));
        }

        if let Some(dir) = non_empty("RELAY_SCRATCH_DIR") {
            self.scratch.dir = Some(PathBuf::from(dir));
        }

        if let Some(port) = non_empty("RELAY_METRICS_PORT") {
            match port.parse() {
                Ok(port) => self.observability.metrics_port = Some(port),
                Err(_) => tracing::warn!("Invalid value for RELAY_METRICS_PORT: '{}'. Ignoring.", port),
            }
        }
    }

    /// Scratch directory to use for this process.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch.dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.archive.bucket.trim().is_empty() {
            anyhow::bail!("archive.bucket cannot be empty (set ARCHIVE_BUCKET)");
        }

        if self.archive.bucket.contains('/') {
            anyhow::bail!("archive.bucket must be a bucket name, not a path: '{}'", self.archive.bucket);
        }

        if self.storage.backend == StorageBackendKind::Local && self.storage.local_root.is_none() {
            anyhow::bail!("storage.local_root is required for the local backend");
        }

        if !matches!(self.observability.log_format.as_str(), "compact" | "json") {
            anyhow::bail!(
                "Invalid observability.log_format: '{}'. Must be 'compact' or 'json'",
                self.observability.log_format
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.storage.backend, StorageBackendKind::S3);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.scratch_dir(), std::env::temp_dir());
        // No archive bucket yet
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let yaml = r#"
archive:
  bucket: audit-archive
storage:
  backend: local
  local_root: /var/lib/relay
scratch:
  dir: /tmp/relay
server:
  port: 9000
"#;
        let config = RelayConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.archive.bucket, "audit-archive");
        assert_eq!(config.storage.backend, StorageBackendKind::Local);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        config.validate().unwrap();

        let reparsed = RelayConfig::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(reparsed.storage.local_root, Some(PathBuf::from("/var/lib/relay")));
        assert_eq!(reparsed.scratch_dir(), PathBuf::from("/tmp/relay"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RelayConfig::default();
        config.apply_overrides(env(&[
            ("S3_BUCKET_NAME", "legacy-bucket"),
            ("RELAY_STORAGE_BACKEND", "memory"),
            ("RELAY_SCRATCH_DIR", "/scratch"),
            ("RELAY_METRICS_PORT", "9100"),
            ("AWS_REGION", "eu-west-2"),
        ]));
        assert_eq!(config.archive.bucket, "legacy-bucket");
        assert_eq!(config.storage.backend, StorageBackendKind::Memory);
        assert_eq!(config.scratch_dir(), PathBuf::from("/scratch"));
        assert_eq!(config.observability.metrics_port, Some(9100));
        assert_eq!(config.storage.region.as_deref(), Some("eu-west-2"));
        config.validate().unwrap();
    }

    #[test]
    fn test_archive_bucket_precedence() {
        let mut config = RelayConfig::default();
        config.apply_overrides(env(&[
            ("S3_BUCKET_NAME", "legacy-bucket"),
            ("ARCHIVE_BUCKET", "primary-bucket"),
        ]));
        assert_eq!(config.archive.bucket, "primary-bucket");
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let mut config = RelayConfig::default();
        config.apply_overrides(env(&[
            ("RELAY_STORAGE_BACKEND", "tape"),
            ("RELAY_METRICS_PORT", "not-a-port"),
        ]));
        assert_eq!(config.storage.backend, StorageBackendKind::S3);
        assert_eq!(config.observability.metrics_port, None);
    }

    #[test]
    fn test_validation() {
        let mut config = RelayConfig::default();
        config.archive.bucket = "archive".into();
        config.validate().unwrap();

        config.storage.backend = StorageBackendKind::Local;
        assert!(config.validate().is_err());
        config.storage.local_root = Some(PathBuf::from("/data"));
        config.validate().unwrap();

        config.archive.bucket = "archive/prefix".into();
        assert!(config.validate().is_err());

        config.archive.bucket = "archive".into();
        config.observability.log_format = "xml".into();
        assert!(config.validate().is_err());
    }
}
