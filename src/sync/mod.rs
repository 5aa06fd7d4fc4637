// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sync master client: endpoint handling, client interface and its HTTP implementation.

pub mod client;
pub mod endpoint;
pub mod http;

pub use client::{SyncMasterClient, SyncMasterConnector, SyncState, SyncStatus, SynchronizationRequest, TlsAuthentication};
pub use endpoint::{resolve_endpoint, Endpoint};
pub use self::http::{HttpSyncMasterClient, HttpSyncMasterConnector};
