// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generic watch-and-requeue reconciliation loop.

pub mod finalizer;
pub mod lifecycle;
pub mod runner;
pub mod schedule;
pub mod trigger;

pub use finalizer::{Cleanup, FinalizerManager, FinalizerStore, KubeFinalizerStore};
pub use lifecycle::LifecycleInspector;
pub use runner::{ControllerHandle, ResourceController};
pub use schedule::{ErrorStreak, ScheduleEntry};
pub use trigger::Trigger;

use crate::error::Result;
use async_trait::async_trait;
use kube::ResourceExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Identity of a watched object
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn from_object<K: ResourceExt>(object: &K) -> Self {
        Self {
            namespace: object.namespace().unwrap_or_default(),
            name: object.name_any(),
        }
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// What to do with an object after an inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Inspect again after the given delay
    Requeue(Duration),
    /// Cleanup finished, the object only needs to disappear from the store
    Released,
}

/// Per-object state handed to an inspection
pub struct Inspection<'a> {
    /// Interval the previous inspection settled on
    pub last_interval: Duration,
    pub error_streak: &'a mut ErrorStreak,
    pub shutdown: &'a CancellationToken,
}

/// Resource specific reconciliation of one object
#[async_trait]
pub trait Inspector<K>: Send + Sync + 'static {
    async fn inspect(&self, object: Arc<K>, inspection: &mut Inspection<'_>) -> Result<Outcome>;
}
