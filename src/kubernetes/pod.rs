// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Lookup of the pod the operator itself runs in.

use crate::config::PodIdentity;
use crate::error::{OperatorError, Result};
use crate::retry::{retry_with_deadline, RetryConfig};
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use tracing::info;

/// What the operator needs to know about its own pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorPod {
    pub image: String,
    pub service_account: String,
}

/// Fetch image and service account of the operator pod, retrying until the
/// configured deadline since the pod may not be visible right after start.
pub async fn get_operator_pod(client: &Client, identity: &PodIdentity, retry: &RetryConfig) -> Result<OperatorPod> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), &identity.namespace);

    let pod = retry_with_deadline(retry, "get operator pod", || pods.get(&identity.name)).await?;
    let info = operator_pod_info(&pod)?;

    info!(
        "Operator pod {}/{} uses image {} with service account {}",
        identity.namespace, identity.name, info.image, info.service_account
    );
    Ok(info)
}

fn operator_pod_info(pod: &Pod) -> Result<OperatorPod> {
    let service_account = pod
        .spec
        .as_ref()
        .and_then(|s| s.service_account_name.clone())
        .unwrap_or_default();

    let from_status = pod
        .status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .and_then(|statuses| statuses.first())
        .map(|s| image_from_id(&s.image_id))
        .filter(|image| !image.is_empty());

    let image = match from_status {
        Some(image) => image,
        None => pod
            .spec
            .as_ref()
            .and_then(|s| s.containers.first())
            .and_then(|c| c.image.clone())
            .ok_or_else(|| OperatorError::ConfigError("operator pod has no container image".to_string()))?,
    };

    Ok(OperatorPod {
        image,
        service_account,
    })
}

/// Strip the runtime prefix from a container image ID, e.g.
/// `docker-pullable://repo/image@sha256:...` becomes `repo/image@sha256:...`
fn image_from_id(image_id: &str) -> String {
    match image_id.split_once("://") {
        Some((_, image)) => image.to_string(),
        None => image_id.to_string(),
    }
}
