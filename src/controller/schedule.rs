// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-object scheduling state: requeue interval and error streak.

use crate::config::InspectionIntervals;
use std::time::Duration;
use tokio::time::Instant;

/// Consecutive failed inspections of one object.
///
/// The first failure after a clean run narrows the interval to the minimum.
/// Further failures keep whatever interval the inspection computed, so the
/// interval is bumped once per streak rather than growing without bound.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ErrorStreak(u32);

impl ErrorStreak {
    pub fn count(&self) -> u32 {
        self.0
    }

    pub fn is_clean(&self) -> bool {
        self.0 == 0
    }

    /// Apply the streak policy to the interval an inspection computed
    pub fn settle(&mut self, has_error: bool, next: Duration, min: Duration) -> Duration {
        if !has_error {
            self.0 = 0;
            return next;
        }
        if self.0 == 0 {
            self.0 += 1;
            return min;
        }
        next
    }
}

/// Schedule record of a single watched object, owned by its worker
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    pub interval: Duration,
    pub error_streak: ErrorStreak,
    pub next_due: Instant,
}

impl ScheduleEntry {
    /// A fresh entry that is due immediately
    pub fn new(initial_interval: Duration) -> Self {
        Self {
            interval: initial_interval,
            error_streak: ErrorStreak::default(),
            next_due: Instant::now(),
        }
    }

    /// Record the interval an inspection returned, clamped to the configured bounds
    pub fn reschedule(&mut self, interval: Duration, bounds: &InspectionIntervals) -> Duration {
        self.interval = bounds.clamp(interval);
        self.next_due = Instant::now() + self.interval;
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: Duration = Duration::from_secs(1);

    #[test]
    fn test_first_error_narrows_to_min() {
        let mut streak = ErrorStreak::default();
        assert_eq!(streak.settle(true, Duration::from_secs(60), MIN), MIN);
        assert_eq!(streak.count(), 1);
    }

    #[test]
    fn test_second_error_does_not_narrow_further() {
        let mut streak = ErrorStreak::default();
        streak.settle(true, Duration::from_secs(60), MIN);

        let next = streak.settle(true, Duration::from_secs(30), MIN);
        assert_eq!(next, Duration::from_secs(30));
        assert_eq!(streak.count(), 1);
    }

    #[test]
    fn test_clean_inspection_resets_streak() {
        let mut streak = ErrorStreak::default();
        streak.settle(true, Duration::from_secs(60), MIN);

        let next = streak.settle(false, Duration::from_secs(10), MIN);
        assert_eq!(next, Duration::from_secs(10));
        assert!(streak.is_clean());
    }

    #[test]
    fn test_reschedule_clamps_to_bounds() {
        let bounds = InspectionIntervals::default();
        let mut entry = ScheduleEntry::new(bounds.max);

        assert_eq!(entry.reschedule(Duration::ZERO, &bounds), bounds.min);
        assert_eq!(entry.reschedule(Duration::from_secs(86400), &bounds), bounds.max);
        assert!(entry.next_due > Instant::now());
    }

    #[test]
    fn test_clamped_interval_always_within_bounds() {
        let bounds = InspectionIntervals::default();
        let mut entry = ScheduleEntry::new(bounds.max);
        for secs in [0, 1, 5, 59, 60, 61, 600] {
            let interval = entry.reschedule(Duration::from_secs(secs), &bounds);
            assert!(interval >= bounds.min && interval <= bounds.max);
        }
    }
}
