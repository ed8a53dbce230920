// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Inference Relay CLI
//!
//! The `inference-relay` binary runs the completion handlers, either once
//! over an event file or as an HTTP invocation host.
//!
//! ## Commands
//!
//! - `inference-relay route --event <FILE|->` - Route outputs and errors into user areas
//! - `inference-relay archive --event <FILE|->` - Archive a batch to bronze and silver
//! - `inference-relay serve` - Host both handlers over HTTP
//! - `inference-relay config show|validate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

use inference_relay::commands::{self, ConfigCommand, InvokeArgs, ServeArgs};
use inference_relay_core::domain::config::RelayConfig;

/// Inference Relay - route and archive asynchronous inference completions
#[derive(Parser)]
#[command(name = "inference-relay")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "RELAY_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true, env = "RELAY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (compact, json); overrides the config file
    #[arg(long, global = true, env = "RELAY_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Route one batch of notifications into user areas
    #[command(name = "route")]
    Route(InvokeArgs),

    /// Archive one batch of notifications
    #[command(name = "archive")]
    Archive(InvokeArgs),

    /// Serve the handlers over HTTP
    #[command(name = "serve")]
    Serve(ServeArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        eprintln!("{}", "No command specified. Use --help for usage.".yellow());
        std::process::exit(1);
    };

    // Config subcommands report load errors themselves
    if let Commands::Config { command } = command {
        init_logging(cli.log_level.as_deref().unwrap_or("warn"), "compact")?;
        return commands::config::handle_command(command, cli.config).await;
    }

    let config = RelayConfig::load_or_default(cli.config.clone())
        .context("Failed to load configuration")?;

    let level = cli
        .log_level
        .unwrap_or_else(|| config.observability.log_level.clone());
    let format = cli
        .log_format
        .unwrap_or_else(|| config.observability.log_format.clone());
    init_logging(&level, &format)?;
    debug!(backend = ?config.storage.backend, "Configuration loaded");

    match command {
        Commands::Route(args) => commands::invoke::route(args, &config).await,
        Commands::Archive(args) => commands::invoke::archive(args, &config).await,
        Commands::Serve(args) => commands::serve::serve(args, config).await,
        Commands::Config { .. } => Ok(()),
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        "json" => builder.json().init(),
        _ => builder.compact().init(),
    }

    Ok(())
}
