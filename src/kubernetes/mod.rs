// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery, operator pod lookup and secret access.

pub mod crd;
pub mod pod;
pub mod secrets;

pub use crd::{crd_retry_config, wait_for_crds};
pub use pod::{get_operator_pod, OperatorPod};
pub use secrets::SecretCredentials;
