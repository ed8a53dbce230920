// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use inference_relay_core::domain::config::{RelayConfig, StorageBackendKind, CONFIG_PATH_ENV};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective configuration as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config = RelayConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./relay-config.yaml");
        println!("  4. ~/.inference-relay/config.yaml");
        println!("  5. /etc/inference-relay/config.yaml");
        println!();
    }

    if as_yaml {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Archive:".bold());
    if config.archive.bucket.is_empty() {
        println!("  Bucket: {}", "(not set)".red());
    } else {
        println!("  Bucket: {}", config.archive.bucket);
    }
    println!();

    println!("{}", "Storage:".bold());
    println!("  Backend: {:?}", config.storage.backend);
    match config.storage.backend {
        StorageBackendKind::S3 => {
            println!(
                "  Region: {}",
                config.storage.region.as_deref().unwrap_or("(environment)")
            );
            if let Some(endpoint) = &config.storage.endpoint {
                println!("  Endpoint: {}", endpoint);
            }
        }
        StorageBackendKind::Local => {
            let root = config
                .storage
                .local_root
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(not set)".to_string());
            println!("  Root: {}", root);
        }
        StorageBackendKind::Memory => {}
    }
    println!("  Scratch: {}", config.scratch_dir().display());
    println!();

    println!("{}", "Server:".bold());
    println!(
        "  Listen: {}:{}",
        config.server.bind_address, config.server.port
    );
    println!(
        "  Logging: {} ({})",
        config.observability.log_level, config.observability.log_format
    );
    match config.observability.metrics_port {
        Some(port) => println!("  Metrics port: {}", port),
        None => println!("  Metrics: {}", "disabled".dimmed()),
    }
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = RelayConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_explicit_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "archive:\n  bucket: audit\nstorage:\n  backend: memory\n",
        )
        .unwrap();
        validate(Some(file.path().to_path_buf())).unwrap();
        show(Some(file.path().to_path_buf()), true, false).unwrap();
    }

    #[test]
    fn test_validate_rejects_unreadable_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "storage: [not, a, map]\n").unwrap();
        assert!(validate(Some(file.path().to_path_buf())).is_err());
    }
}
