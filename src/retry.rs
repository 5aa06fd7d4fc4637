// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded retry with exponential backoff and jitter, for one-shot reads of
//! state that is expected to become available shortly (pod metadata, CRDs).

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, warn};

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Total time after which the last error is returned
    pub max_duration: Duration,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(crate::constants::STARTUP_RETRY_CEILING_SECS),
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(15),
            backoff_multiplier: 2.0,
        }
    }
}

/// Run `operation` until it succeeds or `config.max_duration` has passed.
///
/// Never sleeps past the deadline; the error of the last attempt is returned.
pub async fn retry_with_deadline<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let deadline = Instant::now() + config.max_duration;
    let mut attempt = 0u32;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        let e = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        let now = Instant::now();
        if now >= deadline {
            error!(
                operation = %operation_name,
                attempt,
                error = %e,
                "Operation kept failing until its deadline"
            );
            return Err(e);
        }

        let jitter = rand::thread_rng().gen_range(0.5..1.5);
        let jittered = Duration::from_secs_f64(delay.as_secs_f64() * jitter).min(deadline - now);

        warn!(
            operation = %operation_name,
            attempt,
            error = %e,
            delay_ms = jittered.as_millis(),
            "Operation failed, retrying"
        );

        tokio::time::sleep(jittered).await;

        delay = Duration::from_secs_f64(
            (delay.as_secs_f64() * config.backoff_multiplier).min(config.max_delay.as_secs_f64()),
        );
    }
}
