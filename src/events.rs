// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes Events emitted by the controllers.
//!
//! Publishing is fire-and-forget: a failed event is logged and never fails
//! an inspection.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;
use tracing::warn;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    );
}

/// Publisher backed by `kube::runtime::events::Recorder`
pub struct KubeEventPublisher {
    recorder: Recorder,
}

impl KubeEventPublisher {
    /// `instance` is reported next to the controller name, usually the pod name
    pub fn new(client: Client, controller: &str, instance: &str) -> Self {
        let reporter = Reporter {
            controller: controller.to_string(),
            instance: Some(instance.to_string()),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        let event = Event {
            type_,
            reason: reason.to_string(),
            note,
            action: action.to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, resource_ref).await {
            warn!(reason, action, error = %e, "Failed to publish Kubernetes event");
        }
    }
}

/// Event reasons, shown in the REASON column of `kubectl get events`
pub mod reasons {
    pub const SYNC_CONFIGURED: &str = "SyncConfigured";
    pub const SYNC_CONFIGURE_FAILED: &str = "SyncConfigureFailed";
    pub const SYNC_CANCELLED: &str = "SyncCancelled";
    pub const SYNC_CANCEL_FAILED: &str = "SyncCancelFailed";
    pub const REPLICATION_RELEASED: &str = "ReplicationReleased";
}

pub mod actions {
    pub const CONFIGURE: &str = "Configure";
    pub const CANCEL: &str = "Cancel";
    pub const DELETE: &str = "Delete";
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// A published event, as seen by [`RecordingPublisher`]
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct PublishedEvent {
        pub object: Option<String>,
        pub warning: bool,
        pub reason: String,
        pub action: String,
        pub note: Option<String>,
    }

    #[derive(Default)]
    pub(crate) struct RecordingPublisher {
        pub events: Mutex<Vec<PublishedEvent>>,
    }

    impl RecordingPublisher {
        pub fn reasons(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.reason.clone())
                .collect()
        }
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(
            &self,
            resource_ref: &ObjectReference,
            type_: EventType,
            reason: &str,
            action: &str,
            note: Option<String>,
        ) {
            self.events.lock().unwrap().push(PublishedEvent {
                object: resource_ref.name.clone(),
                warning: matches!(type_, EventType::Warning),
                reason: reason.to_string(),
                action: action.to_string(),
                note,
            });
        }
    }

    #[tokio::test]
    async fn test_recording_publisher_keeps_order() {
        let publisher = RecordingPublisher::default();
        let object = ObjectReference {
            name: Some("repl".to_string()),
            ..Default::default()
        };

        publisher
            .publish(&object, EventType::Normal, reasons::SYNC_CONFIGURED, actions::CONFIGURE, None)
            .await;
        publisher
            .publish(
                &object,
                EventType::Warning,
                reasons::SYNC_CANCEL_FAILED,
                actions::CANCEL,
                Some("unreachable".to_string()),
            )
            .await;

        assert_eq!(publisher.reasons(), vec!["SyncConfigured", "SyncCancelFailed"]);
        assert!(publisher.events.lock().unwrap()[1].warning);
    }

    #[test]
    fn test_kube_publisher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KubeEventPublisher>();
    }
}
