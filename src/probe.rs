// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Liveness and readiness flags shared between controllers and the HTTP server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Set once a controller completed its initial watch sync
#[derive(Clone, Debug, Default)]
pub struct ReadyProbe {
    ready: Arc<AtomicBool>,
}

impl ReadyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

/// Readiness of every kind the operator can control
#[derive(Clone, Debug, Default)]
pub struct Probes {
    pub deployment: ReadyProbe,
    pub deployment_replication: ReadyProbe,
    pub storage: ReadyProbe,
}
