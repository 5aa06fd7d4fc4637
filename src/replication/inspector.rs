// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Inspection of a single DeploymentReplication.
//!
//! Every inspection compares what the destination sync master reports with
//! the source the replication names, records the outcome in the `Configured`
//! condition and issues at most one configure or cancel call. No state is
//! kept between inspections apart from the interval and error streak the
//! controller hands in.

use crate::config::InspectionIntervals;
use crate::constants::conditions::CONFIGURED;
use crate::controller::{FinalizerManager, Inspection, Inspector, ObjectKey, Outcome};
use crate::error::{OperatorError, Result};
use crate::events::{actions, reasons, EventPublisher};
use crate::kubernetes::secrets::SecretCredentials;
use crate::metrics;
use crate::replication::decision::{decide, SyncAction};
use crate::sync::client::{SyncMasterClient, SyncMasterConnector, SynchronizationRequest};
use crate::sync::endpoint::resolve_endpoint;
use crate::types::replication::DeploymentReplicationStatus;
use crate::types::{DeploymentReplication, ManagedResource};
use async_trait::async_trait;
use kube::api::{Patch, PatchParams};
use kube::runtime::events::EventType;
use kube::{Api, Client, Resource, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Persists the status of a replication
#[async_trait]
pub trait StatusWriter: Send + Sync {
    async fn write_status(
        &self,
        object: &DeploymentReplication,
        status: &DeploymentReplicationStatus,
    ) -> Result<()>;
}

/// Writes status with a merge patch on the status subresource
pub struct KubeStatusWriter {
    client: Client,
}

impl KubeStatusWriter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusWriter for KubeStatusWriter {
    async fn write_status(
        &self,
        object: &DeploymentReplication,
        status: &DeploymentReplicationStatus,
    ) -> Result<()> {
        let namespace = object.namespace().unwrap_or_default();
        let api: Api<DeploymentReplication> = Api::namespaced(self.client.clone(), &namespace);
        let patch = serde_json::json!({ "status": status });
        api.patch_status(&object.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

pub struct ReplicationInspector {
    connector: Arc<dyn SyncMasterConnector>,
    credentials: SecretCredentials,
    events: Arc<dyn EventPublisher>,
    finalizers: FinalizerManager<DeploymentReplication>,
    status_writer: Arc<dyn StatusWriter>,
    intervals: InspectionIntervals,
}

/// Mutable result of one inspection
struct Progress {
    next: Duration,
    has_error: bool,
    status: DeploymentReplicationStatus,
    status_changed: bool,
}

fn check_running(shutdown: &CancellationToken) -> Result<()> {
    if shutdown.is_cancelled() {
        return Err(OperatorError::Cancelled);
    }
    Ok(())
}

impl ReplicationInspector {
    pub fn new(
        connector: Arc<dyn SyncMasterConnector>,
        credentials: SecretCredentials,
        events: Arc<dyn EventPublisher>,
        finalizers: FinalizerManager<DeploymentReplication>,
        status_writer: Arc<dyn StatusWriter>,
        intervals: InspectionIntervals,
    ) -> Self {
        Self {
            connector,
            credentials,
            events,
            finalizers,
            status_writer,
            intervals,
        }
    }

    /// Steps run against the sync masters of a live replication
    async fn inspect_sync(
        &self,
        object: &DeploymentReplication,
        progress: &mut Progress,
        shutdown: &CancellationToken,
    ) -> Result<()> {
        let namespace = object.namespace().unwrap_or_default();
        let spec = &object.spec;

        check_running(shutdown)?;
        let destination = match self.connector.connect(&namespace, &spec.destination).await {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to create destination syncmaster client: {}", e);
                progress.has_error = true;
                return Ok(());
            }
        };

        check_running(shutdown)?;
        let destination_status = match destination.status().await {
            Ok(status) => status,
            Err(e) => {
                warn!("Failed to fetch status from destination syncmaster: {}", e);
                progress.has_error = true;
                return Ok(());
            }
        };

        let mut action = SyncAction::None;
        let active = destination_status.is_active();
        let source_matches = if active {
            match resolve_endpoint(&namespace, &spec.source) {
                Ok(source) => Some(destination_status.is_incoming_from(&source)),
                Err(e) => {
                    warn!("Failed to resolve source endpoint: {}", e);
                    progress.has_error = true;
                    None
                }
            }
        } else {
            Some(false)
        };

        if let Some(source_matches) = source_matches {
            let decision = decide(active, source_matches);
            debug!(
                "Destination active={}, source matches={}: {}",
                active, source_matches, decision.reason
            );
            if decision.action == SyncAction::Cancel {
                warn!("{}", decision.message);
            }
            if progress
                .status
                .conditions
                .update(CONFIGURED, decision.configured, decision.reason, decision.message)
            {
                progress.status_changed = true;
            }
            action = decision.action;
        }

        self.inspect_source(object, shutdown).await?;

        match action {
            SyncAction::None => {}
            SyncAction::Cancel => self.cancel(object, destination.as_ref(), progress, shutdown).await?,
            SyncAction::Configure => self.configure(object, destination.as_ref(), progress, shutdown).await?,
        }
        Ok(())
    }

    /// Check whether the source already pushes to the destination. Only logged.
    async fn inspect_source(&self, object: &DeploymentReplication, shutdown: &CancellationToken) -> Result<()> {
        let namespace = object.namespace().unwrap_or_default();
        let spec = &object.spec;

        check_running(shutdown)?;
        let source = match self.connector.connect(&namespace, &spec.source).await {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to create source syncmaster client: {}", e);
                return Ok(());
            }
        };

        check_running(shutdown)?;
        let source_status = match source.status().await {
            Ok(status) => status,
            Err(e) => {
                warn!("Failed to fetch status from source syncmaster: {}", e);
                return Ok(());
            }
        };

        if source_status.is_active() {
            match resolve_endpoint(&namespace, &spec.destination) {
                Ok(destination) => debug!(
                    "Source syncmaster has outgoing synchronization to destination: {}",
                    source_status.has_outgoing_to(&destination)
                ),
                Err(e) => warn!("Failed to check has-outgoing-endpoint: {}", e),
            }
        }
        Ok(())
    }

    async fn cancel(
        &self,
        object: &DeploymentReplication,
        destination: &dyn SyncMasterClient,
        progress: &mut Progress,
        shutdown: &CancellationToken,
    ) -> Result<()> {
        check_running(shutdown)?;
        info!("Canceling synchronization");
        let result = destination.cancel_synchronization().await;
        metrics::record_sync_action(SyncAction::Cancel.label(), result.is_ok());

        match result {
            Ok(()) => {
                info!("Canceled synchronization");
                progress.next = self.intervals.after_sync_action;
                self.publish(object, EventType::Normal, reasons::SYNC_CANCELLED, actions::CANCEL, None)
                    .await;
            }
            Err(e) => {
                warn!("Failed to cancel synchronization: {}", e);
                progress.has_error = true;
                self.publish(
                    object,
                    EventType::Warning,
                    reasons::SYNC_CANCEL_FAILED,
                    actions::CANCEL,
                    Some(e.to_string()),
                )
                .await;
            }
        }
        Ok(())
    }

    async fn configure(
        &self,
        object: &DeploymentReplication,
        destination: &dyn SyncMasterClient,
        progress: &mut Progress,
        shutdown: &CancellationToken,
    ) -> Result<()> {
        let namespace = object.namespace().unwrap_or_default();

        let source = match resolve_endpoint(&namespace, &object.spec.source) {
            Ok(source) => source,
            Err(e) => {
                warn!("Failed to create syncmaster endpoint: {}", e);
                progress.has_error = true;
                return Ok(());
            }
        };

        check_running(shutdown)?;
        let authentication = match self.credentials.tls_authentication(&namespace, &object.spec).await {
            Ok(authentication) => authentication,
            Err(e) => {
                warn!("Failed to configure synchronization authentication: {}", e);
                progress.has_error = true;
                return Ok(());
            }
        };

        let request = SynchronizationRequest {
            source,
            authentication,
        };

        check_running(shutdown)?;
        info!("Configuring synchronization from {}", request.source);
        let result = destination.synchronize(&request).await;
        metrics::record_sync_action(SyncAction::Configure.label(), result.is_ok());

        match result {
            Ok(()) => {
                info!("Configured synchronization");
                progress.next = self.intervals.after_sync_action;
                self.publish(
                    object,
                    EventType::Normal,
                    reasons::SYNC_CONFIGURED,
                    actions::CONFIGURE,
                    Some(format!("Synchronizing from {}", request.source)),
                )
                .await;
            }
            Err(e) => {
                warn!("Failed to configure synchronization: {}", e);
                progress.has_error = true;
                self.publish(
                    object,
                    EventType::Warning,
                    reasons::SYNC_CONFIGURE_FAILED,
                    actions::CONFIGURE,
                    Some(e.to_string()),
                )
                .await;
            }
        }
        Ok(())
    }

    async fn publish(
        &self,
        object: &DeploymentReplication,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        self.events
            .publish(&object.object_ref(&()), type_, reason, action, note)
            .await;
    }
}

#[async_trait]
impl Inspector<DeploymentReplication> for ReplicationInspector {
    #[instrument(skip_all, fields(replication = %ObjectKey::from_object(object.as_ref())))]
    async fn inspect(
        &self,
        object: Arc<DeploymentReplication>,
        inspection: &mut Inspection<'_>,
    ) -> Result<Outcome> {
        let shutdown = inspection.shutdown;
        let mut progress = Progress {
            next: inspection.last_interval,
            has_error: false,
            status: object.status.clone().unwrap_or_default(),
            status_changed: false,
        };

        if !object.is_terminating() {
            check_running(shutdown)?;
            if let Err(e) = self.finalizers.ensure_present(&object).await {
                warn!("Failed to add finalizers: {}", e);
            }
        }

        if object.is_failed() {
            debug!("Deployment replication is in Failed state");
            return Ok(Outcome::Requeue(progress.next));
        }

        if object.is_terminating() {
            check_running(shutdown)?;
            match self.finalizers.run_and_remove(&object).await {
                Ok(()) => return Ok(Outcome::Released),
                Err(e) => {
                    warn!("Failed to run finalizers: {}", e);
                    progress.has_error = true;
                }
            }
        } else {
            self.inspect_sync(&object, &mut progress, shutdown).await?;

            if progress.status_changed {
                check_running(shutdown)?;
                if let Err(e) = self.status_writer.write_status(&object, &progress.status).await {
                    warn!("Failed to update status: {}", e);
                    progress.has_error = true;
                }
            }
        }

        let next = inspection
            .error_streak
            .settle(progress.has_error, progress.next, self.intervals.min);
        Ok(Outcome::Requeue(next.min(self.intervals.max)))
    }
}
