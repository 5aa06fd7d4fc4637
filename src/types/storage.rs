// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::finalizers;
use crate::types::{ManagedResource, Phase};
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Local persistent volume provisioning on a set of node paths
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "replicant.geeko.me", version = "v1alpha", kind = "LocalStorage")]
#[kube(namespaced)]
#[kube(status = "LocalStorageStatus")]
#[serde(rename_all = "camelCase")]
pub struct LocalStorageSpec {
    #[serde(default)]
    pub storage_class: StorageClassSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_path: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageClassSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocalStorageStatus {
    #[serde(default)]
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ManagedResource for LocalStorage {
    const KIND_LABEL: &'static str = "storage";
    const FINALIZER: &'static str = finalizers::CLEANUP;

    fn phase(&self) -> Phase {
        self.status.as_ref().map(|s| s.phase).unwrap_or_default()
    }
}
