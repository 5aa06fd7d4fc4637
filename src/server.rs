// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Health, readiness and metrics endpoints.

use crate::probe::{Probes, ReadyProbe};
use anyhow::Context;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Clone)]
pub struct ServerState {
    pub probes: Probes,
    pub metrics: Option<PrometheusHandle>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready/deployment", get(deployment_ready_handler))
        .route("/ready/deployment-replications", get(replication_ready_handler))
        .route("/ready/storage", get(storage_ready_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Serve until `shutdown` fires
pub async fn serve(addr: SocketAddr, state: ServerState, shutdown: CancellationToken) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Serving health and metrics on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("server error")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

fn readiness(probe: &ReadyProbe) -> StatusCode {
    if probe.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn deployment_ready_handler(State(state): State<ServerState>) -> StatusCode {
    readiness(&state.probes.deployment)
}

async fn replication_ready_handler(State(state): State<ServerState>) -> StatusCode {
    readiness(&state.probes.deployment_replication)
}

async fn storage_ready_handler(State(state): State<ServerState>) -> StatusCode {
    readiness(&state.probes.storage)
}

async fn metrics_handler(State(state): State<ServerState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain")],
            "metrics recorder not installed".to_string(),
        ),
    }
}
