// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::constants::{API_GROUP, API_VERSION};
use crate::error::{OperatorError, Result};
use crate::retry::{retry_with_deadline, RetryConfig};
use kube::{discovery::Discovery, Client};
use std::time::Duration;
use tracing::info;

/// Retry settings used while waiting for CRDs to be installed
pub fn crd_retry_config() -> RetryConfig {
    RetryConfig {
        initial_delay: Duration::from_secs(POLL_INTERVAL_SECS),
        max_delay: Duration::from_secs(POLL_MAX_INTERVAL_SECS),
        ..Default::default()
    }
}

/// Wait until every kind in `kinds` is served under our API group
pub async fn wait_for_crds(client: &Client, kinds: &[&str], retry: &RetryConfig) -> Result<()> {
    retry_with_deadline(retry, "wait for CRDs", || async {
        let missing = missing_kinds(client, kinds).await?;
        if missing.is_empty() {
            Ok(())
        } else {
            Err(OperatorError::ConfigError(format!(
                "CRDs not yet available in {}/{}: {}",
                API_GROUP,
                API_VERSION,
                missing.join(", ")
            )))
        }
    })
    .await?;

    info!("CRDs ({}/{}) are available: {}", API_GROUP, API_VERSION, kinds.join(", "));
    Ok(())
}

async fn missing_kinds(client: &Client, kinds: &[&str]) -> Result<Vec<String>> {
    let discovery = Discovery::new(client.clone())
        .filter(&[API_GROUP])
        .run()
        .await?;

    let mut served: Vec<String> = Vec::new();
    for group in discovery.groups() {
        if group.name() == API_GROUP {
            for (ar, _) in group.recommended_resources() {
                if ar.version == API_VERSION {
                    served.push(ar.kind);
                }
            }
        }
    }

    Ok(kinds
        .iter()
        .filter(|kind| !served.iter().any(|s| s == *kind))
        .map(|kind| kind.to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockService;

    fn group_list_json() -> String {
        serde_json::json!({
            "kind": "APIGroupList",
            "apiVersion": "v1",
            "groups": [{
                "name": API_GROUP,
                "versions": [{"groupVersion": format!("{}/{}", API_GROUP, API_VERSION), "version": API_VERSION}],
                "preferredVersion": {"groupVersion": format!("{}/{}", API_GROUP, API_VERSION), "version": API_VERSION}
            }]
        })
        .to_string()
    }

    fn resource_list_json(kinds: &[(&str, &str)]) -> String {
        let resources: Vec<serde_json::Value> = kinds
            .iter()
            .map(|(plural, kind)| {
                serde_json::json!({
                    "name": plural,
                    "singularName": "",
                    "namespaced": true,
                    "kind": kind,
                    "verbs": ["get", "list", "watch", "patch"]
                })
            })
            .collect();
        serde_json::json!({
            "kind": "APIResourceList",
            "apiVersion": "v1",
            "groupVersion": format!("{}/{}", API_GROUP, API_VERSION),
            "resources": resources
        })
        .to_string()
    }

    fn make_client(kinds: &[(&str, &str)]) -> Client {
        MockService::new()
            .on_get("/apis", 200, &group_list_json())
            .on_get(
                &format!("/apis/{}/{}", API_GROUP, API_VERSION),
                200,
                &resource_list_json(kinds),
            )
            .into_client()
    }

    fn make_retry() -> RetryConfig {
        RetryConfig {
            max_duration: Duration::from_millis(30),
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(10),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_all_kinds_served() {
        let client = make_client(&[
            ("deploymentreplications", "DeploymentReplication"),
            ("localstorages", "LocalStorage"),
        ]);

        wait_for_crds(&client, &["DeploymentReplication", "LocalStorage"], &make_retry())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_kind_times_out() {
        let client = make_client(&[("localstorages", "LocalStorage")]);

        let err = wait_for_crds(&client, &["DeploymentReplication"], &make_retry())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("DeploymentReplication"));
    }
}
