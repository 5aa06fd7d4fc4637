// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::finalizers;
use crate::types::{ManagedResource, Phase};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// A database deployment. Only the fields the replication side depends on are modelled.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "replicant.geeko.me", version = "v1alpha", kind = "DatabaseDeployment")]
#[kube(namespaced)]
#[kube(status = "DatabaseDeploymentStatus")]
#[serde(rename_all = "camelCase")]
pub struct DatabaseDeploymentSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub sync: SyncSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncSpec {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseDeploymentStatus {
    #[serde(default)]
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ManagedResource for DatabaseDeployment {
    const KIND_LABEL: &'static str = "deployment";
    const FINALIZER: &'static str = finalizers::CLEANUP;

    fn phase(&self) -> Phase {
        self.status.as_ref().map(|s| s.phase).unwrap_or_default()
    }
}
