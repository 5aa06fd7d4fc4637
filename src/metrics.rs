// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Operator metrics, exported in Prometheus text format.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

pub const INSPECTIONS_TOTAL: &str = "replicant_inspections_total";
pub const INSPECTION_DURATION: &str = "replicant_inspection_duration_seconds";
pub const SYNC_ACTIONS_TOTAL: &str = "replicant_sync_actions_total";
pub const WATCHED_OBJECTS: &str = "replicant_watched_objects";

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder. Subsequent calls return the existing handle.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(INSPECTIONS_TOTAL, "Inspections run, by kind and result");
    describe_histogram!(INSPECTION_DURATION, "Duration of inspections in seconds");
    describe_counter!(SYNC_ACTIONS_TOTAL, "Configure and cancel calls issued to sync masters");
    describe_gauge!(WATCHED_OBJECTS, "Objects currently tracked by a controller");

    tracing::info!("Prometheus metrics recorder initialized");
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

pub fn record_inspection(kind: &'static str, duration: Duration, success: bool) {
    let result = if success { "success" } else { "error" };
    counter!(INSPECTIONS_TOTAL, "kind" => kind, "result" => result).increment(1);
    histogram!(INSPECTION_DURATION, "kind" => kind).record(duration.as_secs_f64());
}

pub fn record_sync_action(action: &'static str, success: bool) {
    let result = if success { "success" } else { "error" };
    counter!(SYNC_ACTIONS_TOTAL, "action" => action, "result" => result).increment(1);
}

pub fn set_watched_objects(kind: &'static str, count: usize) {
    gauge!(WATCHED_OBJECTS, "kind" => kind).set(count as f64);
}
