// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Starts one controller per enabled kind and keeps them running until shutdown.

use crate::config::{Config, InspectionIntervals};
use crate::constants::OPERATOR_NAME;
use crate::controller::{
    ControllerHandle, FinalizerManager, KubeFinalizerStore, LifecycleInspector, ObjectKey, ResourceController,
};
use crate::events::{EventPublisher, KubeEventPublisher};
use crate::kubernetes::SecretCredentials;
use crate::probe::{Probes, ReadyProbe};
use crate::replication::{replication_finalizers, KubeStatusWriter, ReplicationInspector};
use crate::sync::HttpSyncMasterConnector;
use crate::types::{DatabaseDeployment, DeploymentReplication, LocalStorage, ManagedResource};
use kube::{Api, Client};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Kinds whose CRDs must be installed before the enabled controllers start
pub fn required_kinds(config: &Config) -> Vec<&'static str> {
    let mut kinds = Vec::new();
    if config.modes.deployment {
        kinds.push("DatabaseDeployment");
    }
    if config.modes.deployment_replication {
        kinds.push("DeploymentReplication");
    }
    if config.modes.storage {
        kinds.push("LocalStorage");
    }
    kinds
}

pub struct Operator {
    client: Client,
    config: Config,
    probes: Probes,
}

impl Operator {
    pub fn new(client: Client, config: Config, probes: Probes) -> Self {
        Self { client, config, probes }
    }

    /// Run every enabled controller until `shutdown` fires, then wait for
    /// their in-flight inspections to finish.
    pub async fn run(self, shutdown: CancellationToken) {
        self.start(shutdown).wait().await;
    }

    /// Spawn every enabled controller and return without waiting for them
    pub fn start(self, shutdown: CancellationToken) -> RunningOperator {
        let namespace = self.config.pod.namespace.clone();
        let intervals = self.config.intervals;
        let events: Arc<dyn EventPublisher> = Arc::new(KubeEventPublisher::new(
            self.client.clone(),
            OPERATOR_NAME,
            &self.config.pod.name,
        ));

        let mut controllers: JoinSet<&'static str> = JoinSet::new();
        let mut handles: HashMap<&'static str, ControllerHandle> = HashMap::new();

        if self.config.modes.deployment_replication {
            let credentials = SecretCredentials::new(self.client.clone());
            let inspector = ReplicationInspector::new(
                Arc::new(HttpSyncMasterConnector::new(credentials.clone(), intervals.request_timeout)),
                credentials,
                events.clone(),
                replication_finalizers(self.client.clone(), events.clone()),
                Arc::new(KubeStatusWriter::new(self.client.clone())),
                intervals,
            );
            let (controller, handle) = ResourceController::<DeploymentReplication, _>::new(
                Arc::new(inspector),
                intervals,
                self.probes.deployment_replication.clone(),
            );
            handles.insert(DeploymentReplication::KIND_LABEL, handle);
            let api = Api::namespaced(self.client.clone(), &namespace);
            let shutdown = shutdown.clone();
            controllers.spawn(async move {
                controller.run(api, shutdown).await;
                DeploymentReplication::KIND_LABEL
            });
        }

        if self.config.modes.deployment {
            let handle = self.spawn_lifecycle::<DatabaseDeployment>(
                &mut controllers,
                &namespace,
                intervals,
                self.probes.deployment.clone(),
                &shutdown,
            );
            handles.insert(DatabaseDeployment::KIND_LABEL, handle);
        }

        if self.config.modes.storage {
            let handle = self.spawn_lifecycle::<LocalStorage>(
                &mut controllers,
                &namespace,
                intervals,
                self.probes.storage.clone(),
                &shutdown,
            );
            handles.insert(LocalStorage::KIND_LABEL, handle);
        }

        info!(
            "Operator started {} controller(s) in namespace {}",
            controllers.len(),
            namespace
        );

        RunningOperator { controllers, handles }
    }

    fn spawn_lifecycle<K: ManagedResource>(
        &self,
        controllers: &mut JoinSet<&'static str>,
        namespace: &str,
        intervals: InspectionIntervals,
        readiness: ReadyProbe,
        shutdown: &CancellationToken,
    ) -> ControllerHandle {
        let finalizers = FinalizerManager::<K>::new(Arc::new(KubeFinalizerStore::<K>::new(self.client.clone())));
        let inspector = LifecycleInspector::new(finalizers, intervals);
        let (controller, handle) = ResourceController::<K, _>::new(Arc::new(inspector), intervals, readiness);
        let api = Api::namespaced(self.client.clone(), namespace);
        let shutdown = shutdown.clone();
        controllers.spawn(async move {
            controller.run(api, shutdown).await;
            K::KIND_LABEL
        });
        handle
    }
}

/// Controllers spawned by [`Operator::start`]
pub struct RunningOperator {
    controllers: JoinSet<&'static str>,
    handles: HashMap<&'static str, ControllerHandle>,
}

impl RunningOperator {
    /// Recheck handle of the controller for `kind` (e.g. `"deployment-replication"`), if enabled
    pub fn handle(&self, kind: &str) -> Option<&ControllerHandle> {
        self.handles.get(kind)
    }

    /// Request an immediate inspection of one object. Returns false if the kind is not running.
    pub fn recheck(&self, kind: &str, key: ObjectKey) -> bool {
        match self.handle(kind) {
            Some(handle) => {
                handle.trigger(key);
                true
            }
            None => false,
        }
    }

    /// Wait for every controller to stop
    pub async fn wait(mut self) {
        while let Some(joined) = self.controllers.join_next().await {
            match joined {
                Ok(kind) => info!("{} controller exited", kind),
                Err(e) => error!("Controller task failed: {}", e),
            }
        }
        info!("All controllers stopped");
    }
}
