// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Debounced "something changed" signal.

use std::sync::Arc;
use tokio::sync::Notify;

/// Coalesces any number of `trigger` calls into a single pending wake-up.
///
/// Triggers that arrive while nobody is waiting are remembered, so a waiter
/// never misses a change that happened while it was busy.
#[derive(Clone, Debug, Default)]
pub struct Trigger {
    notify: Arc<Notify>,
}

impl Trigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.notify.notify_one();
    }

    /// Wait until at least one trigger happened since the last wake-up
    pub async fn triggered(&self) {
        self.notify.notified().await;
    }
}
