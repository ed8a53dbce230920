// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP invocation host
//!
//! Exposes both handlers over HTTP until Ctrl+C or SIGTERM, and optionally a
//! Prometheus scrape endpoint.

use anyhow::{Context, Result};
use clap::Args;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use inference_relay_core::domain::config::RelayConfig;
use inference_relay_core::presentation::api;

use crate::services::RelayServices;

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Bind address (overrides server.bind_address)
    #[arg(long, env = "RELAY_HOST")]
    pub host: Option<String>,

    /// Port (overrides server.port)
    #[arg(long, env = "RELAY_PORT")]
    pub port: Option<u16>,
}

pub async fn serve(args: ServeArgs, mut config: RelayConfig) -> Result<()> {
    if let Some(host) = args.host {
        config.server.bind_address = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    if let Some(port) = config.observability.metrics_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Metrics exporter listening on {}", addr);
    }
    inference_relay_core::metrics::register_metrics();

    let services = RelayServices::from_config(&config)?;
    services
        .store
        .health_check()
        .await
        .context("Object store health check failed")?;

    let app = api::app(services.into_app_state());

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(
        archive_bucket = %config.archive.bucket,
        backend = ?config.storage.backend,
        "Relay listening on {}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Relay shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
