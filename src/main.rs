// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::Parser;
use kube::Client;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use replicant::config::{Config, OperatorModes};
use replicant::constants::server::{DEFAULT_HOST, DEFAULT_PORT};
use replicant::kubernetes::{crd_retry_config, get_operator_pod, wait_for_crds};
use replicant::metrics::init_metrics;
use replicant::operator::{required_kinds, Operator};
use replicant::probe::Probes;
use replicant::retry::RetryConfig;
use replicant::server::{self, ServerState};

/// Kubernetes operator for database deployments, replication and local storage
#[derive(Parser, Debug)]
#[command(name = "replicant", version)]
struct Args {
    /// Enable the DatabaseDeployment controller
    #[arg(long = "operator.deployment")]
    deployment: bool,

    /// Enable the DeploymentReplication controller
    #[arg(long = "operator.deployment-replication")]
    deployment_replication: bool,

    /// Enable the LocalStorage controller
    #[arg(long = "operator.storage")]
    storage: bool,

    /// Host the health and metrics server listens on
    #[arg(long = "server.host", default_value = DEFAULT_HOST)]
    server_host: String,

    /// Port the health and metrics server listens on
    #[arg(long = "server.port", default_value_t = DEFAULT_PORT)]
    server_port: u16,

    /// Default log level, RUST_LOG takes precedence
    #[arg(long = "log.level", default_value = "info")]
    log_level: String,
}

impl Args {
    fn modes(&self) -> OperatorModes {
        OperatorModes {
            deployment: self.deployment,
            deployment_replication: self.deployment_replication,
            storage: self.storage,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    info!("Starting replicant operator");

    let config = Config::from_env(args.modes())?;
    info!(
        "Configuration loaded: pod={}/{}, intervals={:?}, modes={:?}",
        config.pod.namespace, config.pod.name, config.intervals, config.modes
    );

    let metrics = init_metrics()?;

    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    let operator_pod = get_operator_pod(&client, &config.pod, &RetryConfig::default())
        .await
        .context("failed to get operator pod info")?;
    info!(
        "Running as {} with service account {}",
        operator_pod.image, operator_pod.service_account
    );

    wait_for_crds(&client, &required_kinds(&config), &crd_retry_config())
        .await
        .context("required CRDs are not installed")?;

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let addr: SocketAddr = format!("{}:{}", args.server_host, args.server_port)
        .parse()
        .with_context(|| format!("invalid server address {}:{}", args.server_host, args.server_port))?;
    let probes = Probes::default();
    let server = tokio::spawn(server::serve(
        addr,
        ServerState {
            probes: probes.clone(),
            metrics: Some(metrics),
        },
        shutdown.clone(),
    ));

    Operator::new(client, config, probes).run(shutdown.clone()).await;

    // Controllers only stop on shutdown, make sure the server follows
    shutdown.cancel();
    match server.await {
        Ok(result) => result?,
        Err(e) => error!("HTTP server task failed: {}", e),
    }

    info!("Replicant operator stopped");
    Ok(())
}

async fn watch_signals(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
                    _ = terminate.recv() => info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                info!("Received SIGINT");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received SIGINT");
    }

    info!("Shutting down");
    shutdown.cancel();
}
