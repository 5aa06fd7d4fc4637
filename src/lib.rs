// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod events;
pub mod kubernetes;
pub mod metrics;
pub mod operator;
pub mod probe;
pub mod replication;
pub mod retry;
pub mod server;
pub mod sync;
pub mod types;

#[cfg(test)]
mod test_utils;
