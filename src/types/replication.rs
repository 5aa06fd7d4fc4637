// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::finalizers;
use crate::types::conditions::{Condition, ConditionList};
use crate::types::{ManagedResource, Phase};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Cross-cluster replication between two sync masters
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "replicant.geeko.me",
    version = "v1alpha",
    kind = "DeploymentReplication",
    shortname = "replication"
)]
#[kube(namespaced)]
#[kube(status = "DeploymentReplicationStatus")]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReplicationSpec {
    pub source: EndpointSpec,
    pub destination: EndpointSpec,
}

/// Identifies a sync master, either through a local deployment or explicit URLs
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub master_endpoint: Vec<String>,
    #[serde(default)]
    pub auth: EndpointAuthenticationSpec,
    #[serde(default)]
    pub tls: EndpointTlsSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointAuthenticationSpec {
    /// Secret holding `tls.keyfile` used for client certificate authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyfile_secret_name: Option<String>,
    /// Secret holding `username` and `password` used for basic authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_secret_name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointTlsSpec {
    /// Secret holding `ca.crt` trusted when talking to the sync master
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_secret_name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReplicationStatus {
    #[serde(default)]
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "ConditionList::is_empty")]
    #[schemars(with = "Vec<Condition>")]
    pub conditions: ConditionList,
}

impl ManagedResource for DeploymentReplication {
    const KIND_LABEL: &'static str = "deployment-replication";
    const FINALIZER: &'static str = finalizers::STOP_SYNC;

    fn phase(&self) -> Phase {
        self.status.as_ref().map(|s| s.phase).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    fn make_replication(status: Option<DeploymentReplicationStatus>) -> DeploymentReplication {
        DeploymentReplication {
            metadata: ObjectMeta {
                name: Some("repl".to_string()),
                namespace: Some("db".to_string()),
                ..Default::default()
            },
            spec: DeploymentReplicationSpec::default(),
            status,
        }
    }

    #[test]
    fn test_phase_defaults_to_running() {
        assert_eq!(make_replication(None).phase(), Phase::Running);
    }

    #[test]
    fn test_phase_from_status() {
        let replication = make_replication(Some(DeploymentReplicationStatus {
            phase: Phase::Failed,
            ..Default::default()
        }));
        assert!(replication.is_failed());
    }

    #[test]
    fn test_spec_deserializes_camel_case() {
        let json = serde_json::json!({
            "source": {
                "masterEndpoint": ["https://dc1.example.com:8629"],
                "auth": {"keyfileSecretName": "src-keyfile"},
                "tls": {"caSecretName": "src-ca"}
            },
            "destination": {"deploymentName": "dc2"}
        });
        let spec: DeploymentReplicationSpec = serde_json::from_value(json).unwrap();
        assert_eq!(spec.source.master_endpoint.len(), 1);
        assert_eq!(spec.source.auth.keyfile_secret_name.as_deref(), Some("src-keyfile"));
        assert_eq!(spec.source.tls.ca_secret_name.as_deref(), Some("src-ca"));
        assert_eq!(spec.destination.deployment_name.as_deref(), Some("dc2"));
    }
}
