// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource definitions managed by the operator.

pub mod conditions;
pub mod deployment;
pub mod replication;
pub mod storage;

pub use conditions::{Condition, ConditionList, ConditionStatus};
pub use deployment::DatabaseDeployment;
pub use replication::{DeploymentReplication, EndpointSpec};
pub use storage::LocalStorage;

use k8s_openapi::NamespaceResourceScope;
use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Coarse lifecycle phase shared by all managed kinds.
///
/// `Failed` is terminal: controllers honor it but never set it themselves.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
pub enum Phase {
    #[default]
    Running,
    Failed,
}

/// Behaviour shared by every kind the operator reconciles
pub trait ManagedResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone + Debug + DeserializeOwned + Serialize + Send + Sync + 'static
{
    /// Short kind name used in logs, metrics and readiness paths
    const KIND_LABEL: &'static str;
    /// Finalizer marker guarding deletion of this kind
    const FINALIZER: &'static str;

    fn phase(&self) -> Phase;

    fn is_failed(&self) -> bool {
        self.phase() == Phase::Failed
    }

    fn is_terminating(&self) -> bool {
        self.meta().deletion_timestamp.is_some()
    }

    fn has_finalizer(&self) -> bool {
        self.finalizers().iter().any(|f| f == Self::FINALIZER)
    }
}
