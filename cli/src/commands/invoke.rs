// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! One-shot handler invocations
//!
//! Commands: route, archive
//!
//! Each reads one event batch from a file (or stdin with `-`), runs the
//! handler once, and exits non-zero if the batch was not fully processed.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};

use inference_relay_core::application::output_router::{RouteOutcome, RouterError};
use inference_relay_core::domain::config::RelayConfig;
use inference_relay_core::domain::notification::EventBatch;

use crate::services::RelayServices;

#[derive(Args, Debug, Clone)]
pub struct InvokeArgs {
    /// Event batch file, or `-` for stdin
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub event: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Read an event batch from a file, or stdin for `-`.
pub fn read_event(path: &Path) -> Result<EventBatch> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file {:?}", path))?
    };

    serde_json::from_str(&raw).context("Event is not a valid notification batch")
}

pub async fn route(args: InvokeArgs, config: &RelayConfig) -> Result<()> {
    let batch = read_event(&args.event)?;
    let services = RelayServices::from_config(config)?;

    match services.router.handle_batch(&batch).await {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            for outcome in &report.outcomes {
                match outcome {
                    RouteOutcome::Copied {
                        inference_id,
                        destination,
                        ..
                    } => println!("  {} {} → {}", "copied".green(), inference_id, destination),
                    RouteOutcome::ErrorStored {
                        inference_id,
                        destination,
                        ..
                    } => println!("  {} {} → {}", "error".yellow(), inference_id, destination),
                    RouteOutcome::Skipped {
                        inference_id,
                        status,
                    } => println!("  {} {} ({})", "skipped".dimmed(), inference_id, status),
                }
            }
            println!(
                "{}",
                format!("✓ Routed {} notification(s)", report.total).green()
            );
            Ok(())
        }
        Err(RouterError::Batch {
            failed,
            total,
            failures,
        }) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&failures)?);
            } else {
                for failure in &failures {
                    eprintln!(
                        "  {} record {}: {}",
                        "failed".red(),
                        failure.index,
                        failure.error
                    );
                }
            }
            bail!("{} of {} notifications failed to route", failed, total)
        }
        Err(e) => Err(e).context("Routing failed"),
    }
}

pub async fn archive(args: InvokeArgs, config: &RelayConfig) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")?;

    let batch = read_event(&args.event)?;
    let services = RelayServices::from_config(config)?;

    let report = services
        .archiver
        .archive_batch(&batch)
        .await
        .context("Archiving failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("  bronze: s3://{}/{}", report.bucket, report.bronze_key);
        println!("  silver: s3://{}/{}", report.bucket, report.silver_key);
        println!(
            "{}",
            format!(
                "✓ Archived {} row(s), {} skipped, load timestamp {}",
                report.rows, report.skipped, report.load_timestamp
            )
            .green()
        );
    }

    Ok(())
}
