// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{env as vars, inspection};
use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

/// Identity of the pod the operator runs in
#[derive(Debug, Clone)]
pub struct PodIdentity {
    pub namespace: String,
    pub name: String,
    pub ip: String,
}

/// Bounds and fixed delays used when scheduling inspections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectionIntervals {
    pub min: Duration,
    pub max: Duration,
    /// Delay before rechecking after a configure or cancel call succeeded
    pub after_sync_action: Duration,
    /// Timeout applied to every single sync master request
    pub request_timeout: Duration,
}

impl Default for InspectionIntervals {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(inspection::MIN_INTERVAL_SECS),
            max: Duration::from_secs(inspection::MAX_INTERVAL_SECS),
            after_sync_action: Duration::from_secs(inspection::AFTER_SYNC_ACTION_SECS),
            request_timeout: Duration::from_secs(inspection::SYNC_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl InspectionIntervals {
    /// Clamp an interval to `[min, max]`
    pub fn clamp(&self, interval: Duration) -> Duration {
        interval.clamp(self.min, self.max)
    }
}

/// Which resource kinds the operator controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperatorModes {
    pub deployment: bool,
    pub deployment_replication: bool,
    pub storage: bool,
}

impl OperatorModes {
    pub fn any(&self) -> bool {
        self.deployment || self.deployment_replication || self.storage
    }
}

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub pod: PodIdentity,
    pub intervals: InspectionIntervals,
    pub modes: OperatorModes,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Fails when the pod identity is incomplete or when no operator mode is enabled.
    pub fn from_env(modes: OperatorModes) -> Result<Self> {
        if !modes.any() {
            bail!(
                "Turn on --operator.deployment, --operator.deployment-replication, --operator.storage or any combination of these"
            );
        }

        let pod = PodIdentity {
            namespace: required_var(vars::POD_NAMESPACE)?,
            name: required_var(vars::POD_NAME)?,
            ip: required_var(vars::POD_IP)?,
        };

        let defaults = InspectionIntervals::default();
        let intervals = InspectionIntervals {
            min: seconds_var(vars::MIN_INSPECTION_INTERVAL_SECS, defaults.min)?,
            max: seconds_var(vars::MAX_INSPECTION_INTERVAL_SECS, defaults.max)?,
            request_timeout: seconds_var(vars::SYNC_REQUEST_TIMEOUT_SECS, defaults.request_timeout)?,
            ..defaults
        };
        if intervals.min > intervals.max {
            bail!(
                "{} ({:?}) must not exceed {} ({:?})",
                vars::MIN_INSPECTION_INTERVAL_SECS,
                intervals.min,
                vars::MAX_INSPECTION_INTERVAL_SECS,
                intervals.max
            );
        }

        Ok(Config {
            pod,
            intervals,
            modes,
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    let value = env::var(name).with_context(|| format!("{} environment variable missing", name))?;
    if value.is_empty() {
        bail!("{} environment variable is empty", name);
    }
    Ok(value)
}

fn seconds_var(name: &str, default: Duration) -> Result<Duration> {
    match env::var(name) {
        Ok(raw) => {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", name))?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_raises_to_min() {
        let intervals = InspectionIntervals::default();
        assert_eq!(intervals.clamp(Duration::ZERO), intervals.min);
    }

    #[test]
    fn test_clamp_lowers_to_max() {
        let intervals = InspectionIntervals::default();
        assert_eq!(intervals.clamp(Duration::from_secs(3600)), intervals.max);
    }

    #[test]
    fn test_clamp_keeps_value_in_range() {
        let intervals = InspectionIntervals::default();
        assert_eq!(
            intervals.clamp(Duration::from_secs(10)),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_no_mode_enabled_is_rejected() {
        let err = Config::from_env(OperatorModes::default()).unwrap_err();
        assert!(err.to_string().contains("--operator.deployment"));
    }

    #[test]
    fn test_modes_any() {
        let modes = OperatorModes {
            storage: true,
            ..Default::default()
        };
        assert!(modes.any());
        assert!(!OperatorModes::default().any());
    }
}
