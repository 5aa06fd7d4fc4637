// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Client interface of a remote sync master.

use crate::error::Result;
use crate::sync::endpoint::Endpoint;
use crate::types::EndpointSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Synchronization state reported by a sync master
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    #[default]
    Inactive,
    Initializing,
    Initialized,
    Running,
    Cancelling,
    Failed,
}

impl SyncState {
    pub fn is_active(self) -> bool {
        self != SyncState::Inactive
    }
}

/// An outgoing synchronization of a source sync master
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingSync {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub endpoint: Endpoint,
    #[serde(default)]
    pub status: SyncState,
}

/// Status snapshot of a sync master
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    #[serde(default)]
    pub status: SyncState,
    /// Endpoint(s) this master currently synchronizes from
    #[serde(default)]
    pub source: Endpoint,
    /// Targets this master currently synchronizes to
    #[serde(default)]
    pub outgoing: Vec<OutgoingSync>,
}

impl SyncStatus {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// True when this master synchronizes from (part of) the given endpoint
    pub fn is_incoming_from(&self, endpoint: &Endpoint) -> bool {
        self.source.intersects(endpoint)
    }

    /// True when any outgoing synchronization targets (part of) the given endpoint
    pub fn has_outgoing_to(&self, endpoint: &Endpoint) -> bool {
        self.outgoing.iter().any(|o| o.endpoint.intersects(endpoint))
    }
}

/// Client certificate material the destination uses to connect to the source
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TlsAuthentication {
    pub client_certificate: String,
    pub client_key: String,
    pub ca_certificate: String,
}

impl std::fmt::Debug for TlsAuthentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsAuthentication")
            .field("client_certificate", &"<redacted>")
            .field("client_key", &"<redacted>")
            .field("ca_certificate", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SynchronizationRequest {
    pub source: Endpoint,
    pub authentication: TlsAuthentication,
}

/// Operations on a single sync master
#[async_trait]
pub trait SyncMasterClient: Send + Sync {
    async fn status(&self) -> Result<SyncStatus>;

    /// Configure this master to synchronize from the requested source
    async fn synchronize(&self, request: &SynchronizationRequest) -> Result<()>;

    /// Stop the synchronization this master is currently running
    async fn cancel_synchronization(&self) -> Result<()>;
}

/// Creates sync master clients for endpoint specs
#[async_trait]
pub trait SyncMasterConnector: Send + Sync {
    async fn connect(&self, namespace: &str, spec: &EndpointSpec) -> Result<Arc<dyn SyncMasterClient>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_is_not_active() {
        assert!(!SyncState::Inactive.is_active());
        assert!(SyncState::Running.is_active());
        assert!(SyncState::Cancelling.is_active());
    }

    #[test]
    fn test_status_deserializes_with_defaults() {
        let status: SyncStatus = serde_json::from_value(serde_json::json!({
            "status": "running",
            "source": ["https://dc1:8629"]
        }))
        .unwrap();
        assert!(status.is_active());
        assert!(status.outgoing.is_empty());
        assert!(status.is_incoming_from(&Endpoint::new(["https://dc1:8629/"])));
    }

    #[test]
    fn test_has_outgoing_to() {
        let status = SyncStatus {
            status: SyncState::Running,
            source: Endpoint::default(),
            outgoing: vec![OutgoingSync {
                id: "1".to_string(),
                endpoint: Endpoint::new(["https://dc2:8629"]),
                status: SyncState::Running,
            }],
        };
        assert!(status.has_outgoing_to(&Endpoint::new(["https://dc2:8629", "https://other:1"])));
        assert!(!status.has_outgoing_to(&Endpoint::new(["https://dc3:8629"])));
    }

    #[test]
    fn test_tls_authentication_debug_is_redacted() {
        let auth = TlsAuthentication {
            client_certificate: "cert".to_string(),
            client_key: "very-secret".to_string(),
            ca_certificate: "ca".to_string(),
        };
        assert!(!format!("{:?}", auth).contains("very-secret"));
    }
}
