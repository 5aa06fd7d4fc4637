// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Inspector for kinds whose only concern here is their deletion lifecycle.

use crate::config::InspectionIntervals;
use crate::controller::{FinalizerManager, Inspection, Inspector, Outcome};
use crate::error::{OperatorError, Result};
use crate::types::ManagedResource;
use async_trait::async_trait;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Keeps the finalizer marker on live objects, releases deleted ones and
/// otherwise rechecks at the max interval. Failed objects are left alone.
pub struct LifecycleInspector<K> {
    finalizers: FinalizerManager<K>,
    intervals: InspectionIntervals,
}

impl<K: ManagedResource> LifecycleInspector<K> {
    pub fn new(finalizers: FinalizerManager<K>, intervals: InspectionIntervals) -> Self {
        Self {
            finalizers,
            intervals,
        }
    }
}

#[async_trait]
impl<K: ManagedResource> Inspector<K> for LifecycleInspector<K> {
    #[instrument(skip_all, fields(kind = K::KIND_LABEL, object = %object.name_any()))]
    async fn inspect(&self, object: Arc<K>, inspection: &mut Inspection<'_>) -> Result<Outcome> {
        if inspection.shutdown.is_cancelled() {
            return Err(OperatorError::Cancelled);
        }

        if object.is_terminating() {
            return match self.finalizers.run_and_remove(&object).await {
                Ok(()) => {
                    info!("{} released", K::KIND_LABEL);
                    Ok(Outcome::Released)
                }
                Err(e) => {
                    warn!("Failed to run finalizers: {}", e);
                    let next = inspection
                        .error_streak
                        .settle(true, inspection.last_interval, self.intervals.min);
                    Ok(Outcome::Requeue(next))
                }
            };
        }

        let mut has_error = false;
        if let Err(e) = self.finalizers.ensure_present(&object).await {
            warn!("Failed to add finalizer: {}", e);
            has_error = true;
        }

        if object.is_failed() {
            debug!("{} is failed, nothing to do", K::KIND_LABEL);
            return Ok(Outcome::Requeue(inspection.last_interval));
        }

        let next = inspection
            .error_streak
            .settle(has_error, self.intervals.max, self.intervals.min);
        Ok(Outcome::Requeue(next.min(self.intervals.max)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::finalizers::CLEANUP;
    use crate::controller::finalizer::tests::RecordingStore;
    use crate::controller::ErrorStreak;
    use crate::types::deployment::{DatabaseDeploymentSpec, DatabaseDeploymentStatus};
    use crate::types::storage::LocalStorageSpec;
    use crate::types::{DatabaseDeployment, LocalStorage, Phase};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use kube::api::ObjectMeta;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn make_meta(finalizers: &[&str], deleting: bool) -> ObjectMeta {
        ObjectMeta {
            name: Some("db1".to_string()),
            namespace: Some("db".to_string()),
            finalizers: Some(finalizers.iter().map(|f| f.to_string()).collect()),
            deletion_timestamp: deleting.then(|| Time(chrono::Utc::now())),
            ..Default::default()
        }
    }

    fn make_deployment(finalizers: &[&str], deleting: bool, phase: Phase) -> DatabaseDeployment {
        DatabaseDeployment {
            metadata: make_meta(finalizers, deleting),
            spec: DatabaseDeploymentSpec::default(),
            status: Some(DatabaseDeploymentStatus { phase, reason: None }),
        }
    }

    fn make_storage(finalizers: &[&str], deleting: bool) -> LocalStorage {
        LocalStorage {
            metadata: make_meta(finalizers, deleting),
            spec: LocalStorageSpec::default(),
            status: None,
        }
    }

    async fn run_inspection<K: ManagedResource>(
        inspector: &LifecycleInspector<K>,
        object: K,
        streak: &mut ErrorStreak,
    ) -> Result<Outcome> {
        let shutdown = CancellationToken::new();
        let mut inspection = Inspection {
            last_interval: Duration::from_secs(30),
            error_streak: streak,
            shutdown: &shutdown,
        };
        inspector.inspect(Arc::new(object), &mut inspection).await
    }

    #[tokio::test]
    async fn test_live_object_gets_marker_and_max_interval() {
        let store = Arc::new(RecordingStore::default());
        let inspector = LifecycleInspector::new(
            FinalizerManager::<DatabaseDeployment>::new(store.clone()),
            InspectionIntervals::default(),
        );
        let mut streak = ErrorStreak::default();

        let outcome = run_inspection(&inspector, make_deployment(&[], false, Phase::Running), &mut streak)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Requeue(InspectionIntervals::default().max));
        assert_eq!(
            store.writes.lock().unwrap().as_slice(),
            &[vec![CLEANUP.to_string()]]
        );
    }

    #[tokio::test]
    async fn test_failed_object_keeps_last_interval() {
        let store = Arc::new(RecordingStore::default());
        let inspector = LifecycleInspector::new(
            FinalizerManager::<DatabaseDeployment>::new(store.clone()),
            InspectionIntervals::default(),
        );
        let mut streak = ErrorStreak::default();

        let outcome = run_inspection(
            &inspector,
            make_deployment(&[CLEANUP], false, Phase::Failed),
            &mut streak,
        )
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Requeue(Duration::from_secs(30)));
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_object_is_released() {
        let store = Arc::new(RecordingStore::default());
        let inspector = LifecycleInspector::new(
            FinalizerManager::<LocalStorage>::new(store.clone()),
            InspectionIntervals::default(),
        );
        let mut streak = ErrorStreak::default();

        let outcome = run_inspection(&inspector, make_storage(&[CLEANUP], true), &mut streak)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Released);
        assert_eq!(store.writes.lock().unwrap().as_slice(), &[Vec::<String>::new()]);
    }

    #[tokio::test]
    async fn test_marker_write_failure_narrows_interval_once() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let intervals = InspectionIntervals::default();
        let inspector = LifecycleInspector::new(FinalizerManager::<LocalStorage>::new(store), intervals);
        let mut streak = ErrorStreak::default();

        let first = run_inspection(&inspector, make_storage(&[], false), &mut streak)
            .await
            .unwrap();
        let second = run_inspection(&inspector, make_storage(&[], false), &mut streak)
            .await
            .unwrap();

        assert_eq!(first, Outcome::Requeue(intervals.min));
        assert_eq!(second, Outcome::Requeue(intervals.max));
        assert_eq!(streak.count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_inspection_writes_nothing() {
        let store = Arc::new(RecordingStore::default());
        let inspector = LifecycleInspector::new(
            FinalizerManager::<LocalStorage>::new(store.clone()),
            InspectionIntervals::default(),
        );
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let mut streak = ErrorStreak::default();
        let mut inspection = Inspection {
            last_interval: Duration::from_secs(30),
            error_streak: &mut streak,
            shutdown: &shutdown,
        };

        let result = inspector
            .inspect(Arc::new(make_storage(&[], false)), &mut inspection)
            .await;

        assert!(matches!(result, Err(OperatorError::Cancelled)));
        assert!(store.writes.lock().unwrap().is_empty());
    }
}
