// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// API group of all custom resources managed by the operator
pub const API_GROUP: &str = "replicant.geeko.me";

/// API version of all custom resources managed by the operator
pub const API_VERSION: &str = "v1alpha";

/// The operator name used for events and field management
pub const OPERATOR_NAME: &str = "replicant";

/// Finalizer markers
pub mod finalizers {
    /// Guards a DeploymentReplication until its sync bookkeeping is released
    pub const STOP_SYNC: &str = "replicant.geeko.me/stop-sync";
    /// Guards DatabaseDeployment and LocalStorage resources
    pub const CLEANUP: &str = "replicant.geeko.me/cleanup";
}

/// Condition types written to resource status
pub mod conditions {
    /// Destination sync master is configured for the expected source
    pub const CONFIGURED: &str = "Configured";
}

/// Environment variables the operator pod must provide
pub mod env {
    pub const POD_NAMESPACE: &str = "MY_POD_NAMESPACE";
    pub const POD_NAME: &str = "MY_POD_NAME";
    pub const POD_IP: &str = "MY_POD_IP";
    pub const MIN_INSPECTION_INTERVAL_SECS: &str = "MIN_INSPECTION_INTERVAL_SECS";
    pub const MAX_INSPECTION_INTERVAL_SECS: &str = "MAX_INSPECTION_INTERVAL_SECS";
    pub const SYNC_REQUEST_TIMEOUT_SECS: &str = "SYNC_REQUEST_TIMEOUT_SECS";
}

/// Inspection scheduling defaults
pub mod inspection {
    pub const MIN_INTERVAL_SECS: u64 = 1;
    pub const MAX_INTERVAL_SECS: u64 = 60;
    /// Recheck delay after a configure or cancel call succeeded
    pub const AFTER_SYNC_ACTION_SECS: u64 = 10;
    pub const SYNC_REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Sync master addressing
pub mod syncmaster {
    /// Port of the sync master service of a local deployment
    pub const PORT: u16 = 8629;
    /// Service name suffix of the sync master of a local deployment
    pub const SERVICE_SUFFIX: &str = "-sync";
    /// Secret key holding a PEM client certificate and key
    pub const KEYFILE_KEY: &str = "tls.keyfile";
    /// Secret key holding the PEM CA certificate
    pub const CA_CERT_KEY: &str = "ca.crt";
    pub const USERNAME_KEY: &str = "username";
    pub const PASSWORD_KEY: &str = "password";
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}

/// Ceiling for one-shot startup lookups that are expected to succeed eventually
pub const STARTUP_RETRY_CEILING_SECS: u64 = 300;

/// Health, readiness and metrics server
pub mod server {
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8528;
}
