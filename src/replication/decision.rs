// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! What to do with a destination sync master, given what it reports.
//!
//! | destination active | source matches | Configured          | action    |
//! |--------------------|----------------|---------------------|-----------|
//! | yes                | yes            | `true` / `Active`   | none      |
//! | yes                | no             | `false` / `Invalid` | cancel    |
//! | no                 | (ignored)      | `false` / `Inactive`| configure |

/// Remote mutation issued on the destination. At most one per inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    None,
    Configure,
    Cancel,
}

impl SyncAction {
    pub fn label(self) -> &'static str {
        match self {
            SyncAction::None => "none",
            SyncAction::Configure => "configure",
            SyncAction::Cancel => "cancel",
        }
    }
}

pub mod reasons {
    pub const ACTIVE: &str = "Active";
    pub const INVALID: &str = "Invalid";
    pub const INACTIVE: &str = "Inactive";
}

/// Value of the `Configured` condition plus the action to take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub configured: bool,
    pub reason: &'static str,
    pub message: &'static str,
    pub action: SyncAction,
}

pub fn decide(destination_active: bool, source_matches: bool) -> Decision {
    match (destination_active, source_matches) {
        (true, true) => Decision {
            configured: true,
            reason: reasons::ACTIVE,
            message: "Destination syncmaster is configured correctly and active",
            action: SyncAction::None,
        },
        (true, false) => Decision {
            configured: false,
            reason: reasons::INVALID,
            message: "Destination syncmaster is configured for different source",
            action: SyncAction::Cancel,
        },
        (false, _) => Decision {
            configured: false,
            reason: reasons::INACTIVE,
            message: "Destination syncmaster is configured correctly but in-active",
            action: SyncAction::Configure,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_and_matching_needs_nothing() {
        let decision = decide(true, true);
        assert!(decision.configured);
        assert_eq!(decision.reason, reasons::ACTIVE);
        assert_eq!(decision.action, SyncAction::None);
    }

    #[test]
    fn test_active_with_other_source_is_cancelled() {
        let decision = decide(true, false);
        assert!(!decision.configured);
        assert_eq!(decision.reason, reasons::INVALID);
        assert_eq!(decision.action, SyncAction::Cancel);
    }

    #[test]
    fn test_inactive_is_configured_regardless_of_source() {
        assert_eq!(decide(false, true), decide(false, false));
        assert_eq!(decide(false, true).action, SyncAction::Configure);
        assert_eq!(decide(false, true).reason, reasons::INACTIVE);
    }

    #[test]
    fn test_only_inactive_configures_only_invalid_cancels() {
        for active in [true, false] {
            for matches in [true, false] {
                let decision = decide(active, matches);
                assert_eq!(decision.action == SyncAction::Configure, !active);
                assert_eq!(decision.action == SyncAction::Cancel, active && !matches);
                assert_eq!(decision.configured, decision.action == SyncAction::None);
            }
        }
    }
}
