// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperatorError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Sync master request failed: {0}")]
    SyncMasterError(String),

    #[error("Invalid endpoint: {0}")]
    EndpointError(String),

    #[error("Failed to load credentials: {0}")]
    CredentialsError(String),

    #[error("Finalizer failed: {0}")]
    FinalizerError(String),

    #[error("{0} timed out after {1:?}")]
    Timeout(String, Duration),

    #[error("Inspection panicked: {0}")]
    InspectionPanicked(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, OperatorError>;
