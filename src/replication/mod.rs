// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cross-cluster replication: keeps a destination sync master synchronizing
//! from the source a DeploymentReplication names.

pub mod decision;
pub mod inspector;

pub use decision::{decide, Decision, SyncAction};
pub use inspector::{KubeStatusWriter, ReplicationInspector, StatusWriter};

use crate::controller::{Cleanup, FinalizerManager, KubeFinalizerStore};
use crate::error::Result;
use crate::events::{actions, reasons, EventPublisher};
use crate::sync::endpoint::resolve_endpoint;
use crate::types::{DeploymentReplication, EndpointSpec};
use async_trait::async_trait;
use kube::runtime::events::EventType;
use kube::{Client, Resource, ResourceExt};
use std::sync::Arc;
use tracing::info;

/// Finalizer handling for replications, persisted through the API server
pub fn replication_finalizers(
    client: Client,
    events: Arc<dyn EventPublisher>,
) -> FinalizerManager<DeploymentReplication> {
    FinalizerManager::new(Arc::new(KubeFinalizerStore::<DeploymentReplication>::new(client)))
        .with_cleanup(Arc::new(ReleaseReplication::new(events)))
}

/// Lets go of a deleted replication. The remote sync masters are not touched
/// once deletion was requested, so all this does is record which link was
/// released.
pub struct ReleaseReplication {
    events: Arc<dyn EventPublisher>,
}

impl ReleaseReplication {
    pub fn new(events: Arc<dyn EventPublisher>) -> Self {
        Self { events }
    }
}

fn describe(namespace: &str, spec: &EndpointSpec) -> String {
    resolve_endpoint(namespace, spec)
        .map(|e| e.to_string())
        .unwrap_or_else(|_| "<unresolved>".to_string())
}

#[async_trait]
impl Cleanup<DeploymentReplication> for ReleaseReplication {
    fn name(&self) -> &str {
        "release-replication"
    }

    async fn run(&self, object: &DeploymentReplication) -> Result<()> {
        let namespace = object.namespace().unwrap_or_default();
        let note = format!(
            "Released replication from {} to {}",
            describe(&namespace, &object.spec.source),
            describe(&namespace, &object.spec.destination)
        );
        info!("{}", note);
        self.events
            .publish(
                &object.object_ref(&()),
                EventType::Normal,
                reasons::REPLICATION_RELEASED,
                actions::DELETE,
                Some(note),
            )
            .await;
        Ok(())
    }
}
