// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deletion guards: add the marker while an object lives, run cleanup and
//! drop the marker once it is deleted.

use crate::error::{OperatorError, Result};
use crate::types::ManagedResource;
use async_trait::async_trait;
use kube::{
    api::{Patch, PatchParams},
    Api, Client, ResourceExt,
};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Persists the finalizer list of an object
#[async_trait]
pub trait FinalizerStore<K>: Send + Sync {
    async fn set_finalizers(&self, object: &K, finalizers: Vec<String>) -> Result<()>;
}

/// Cleanup that must succeed before the finalizer marker is removed
#[async_trait]
pub trait Cleanup<K>: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, object: &K) -> Result<()>;
}

/// Writes finalizers with a JSON merge patch. The patch carries the
/// resourceVersion the change was computed from, so a concurrent update
/// makes it fail instead of clobbering the list.
pub struct KubeFinalizerStore<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K> KubeFinalizerStore<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }
}

#[async_trait]
impl<K: ManagedResource> FinalizerStore<K> for KubeFinalizerStore<K> {
    async fn set_finalizers(&self, object: &K, finalizers: Vec<String>) -> Result<()> {
        let namespace = object.namespace().unwrap_or_default();
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);

        let mut metadata = serde_json::json!({ "finalizers": finalizers });
        if let Some(version) = object.resource_version() {
            metadata["resourceVersion"] = version.into();
        }
        let patch = serde_json::json!({ "metadata": metadata });
        api.patch(&object.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

pub struct FinalizerManager<K> {
    store: Arc<dyn FinalizerStore<K>>,
    cleanups: Vec<Arc<dyn Cleanup<K>>>,
}

impl<K: ManagedResource> FinalizerManager<K> {
    pub fn new(store: Arc<dyn FinalizerStore<K>>) -> Self {
        Self {
            store,
            cleanups: Vec::new(),
        }
    }

    /// Register a cleanup that runs before the marker is removed
    pub fn with_cleanup(mut self, cleanup: Arc<dyn Cleanup<K>>) -> Self {
        self.cleanups.push(cleanup);
        self
    }

    /// Add the marker if it is missing. Returns true when a write happened.
    #[instrument(skip(self, object), fields(object = %object.name_any()))]
    pub async fn ensure_present(&self, object: &K) -> Result<bool> {
        if object.has_finalizer() {
            return Ok(false);
        }

        let mut finalizers = object.finalizers().to_vec();
        finalizers.push(K::FINALIZER.to_string());
        self.store.set_finalizers(object, finalizers).await?;

        debug!("Added finalizer {}", K::FINALIZER);
        Ok(true)
    }

    /// Run every cleanup and remove the marker when all of them succeeded.
    /// On failure the first error is returned and the marker stays in place.
    #[instrument(skip(self, object), fields(object = %object.name_any()))]
    pub async fn run_and_remove(&self, object: &K) -> Result<()> {
        if !object.has_finalizer() {
            return Ok(());
        }

        let mut first_error: Option<OperatorError> = None;
        for cleanup in &self.cleanups {
            if let Err(e) = cleanup.run(object).await {
                warn!("Cleanup '{}' failed: {}", cleanup.name(), e);
                first_error.get_or_insert(OperatorError::FinalizerError(format!(
                    "{}: {}",
                    cleanup.name(),
                    e
                )));
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let remaining: Vec<String> = object
            .finalizers()
            .iter()
            .filter(|f| f.as_str() != K::FINALIZER)
            .cloned()
            .collect();
        self.store.set_finalizers(object, remaining).await?;

        info!("Removed finalizer {}", K::FINALIZER);
        Ok(())
    }
}
