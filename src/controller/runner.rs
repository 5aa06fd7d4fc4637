// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watch-driven controller that runs one worker per object.
//!
//! The dispatcher consumes watch events and routes them to per-object worker
//! tasks. A worker owns the schedule of its object and runs inspections
//! strictly one after the other, so an object is never inspected twice at
//! the same time while different objects proceed independently.

use crate::config::InspectionIntervals;
use crate::controller::schedule::ScheduleEntry;
use crate::controller::trigger::Trigger;
use crate::controller::{Inspection, Inspector, ObjectKey, Outcome};
use crate::error::{OperatorError, Result};
use crate::metrics;
use crate::probe::ReadyProbe;
use crate::types::ManagedResource;
use futures::{FutureExt, Stream, StreamExt};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::Api;
use kube_runtime::watcher::{self, Event};
use kube_runtime::WatchStreamExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Requests an immediate inspection of an object, as if it had been updated
#[derive(Clone)]
pub struct ControllerHandle {
    recheck_tx: mpsc::UnboundedSender<ObjectKey>,
}

impl ControllerHandle {
    pub fn trigger(&self, key: ObjectKey) {
        if let Err(e) = self.recheck_tx.send(key) {
            warn!("Controller is no longer running, dropping recheck of {}", e.0);
        }
    }
}

/// Latest known state of one object, shared between dispatcher and worker
struct WorkerSlot<K> {
    object: Mutex<Arc<K>>,
    deleted: AtomicBool,
    trigger: Trigger,
}

impl<K> WorkerSlot<K> {
    fn new(object: Arc<K>) -> Self {
        Self {
            object: Mutex::new(object),
            deleted: AtomicBool::new(false),
            trigger: Trigger::new(),
        }
    }

    fn object(&self) -> Arc<K> {
        self.object
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn replace(&self, object: Arc<K>) {
        *self
            .object
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = object;
    }

    fn mark_deleted(&self) {
        self.deleted.store(true, Ordering::SeqCst);
    }

    fn restore(&self) {
        self.deleted.store(false, Ordering::SeqCst);
    }

    fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::SeqCst)
    }
}

pub struct ResourceController<K, I> {
    inspector: Arc<I>,
    intervals: InspectionIntervals,
    readiness: ReadyProbe,
    recheck_rx: mpsc::UnboundedReceiver<ObjectKey>,
    _kind: std::marker::PhantomData<fn() -> K>,
}

impl<K, I> ResourceController<K, I>
where
    K: ManagedResource,
    I: Inspector<K>,
{
    pub fn new(inspector: Arc<I>, intervals: InspectionIntervals, readiness: ReadyProbe) -> (Self, ControllerHandle) {
        let (recheck_tx, recheck_rx) = mpsc::unbounded_channel();
        let controller = Self {
            inspector,
            intervals,
            readiness,
            recheck_rx,
            _kind: std::marker::PhantomData,
        };
        (controller, ControllerHandle { recheck_tx })
    }

    /// Watch all objects of the kind through `api` until `shutdown` fires
    pub async fn run(self, api: Api<K>, shutdown: CancellationToken) {
        let events = watcher::watcher(api, watcher::Config::default()).default_backoff();
        self.run_with_events(events, shutdown).await;
    }

    /// Drive the controller from an arbitrary watch event stream.
    ///
    /// Returns after `shutdown` fired and every in-flight inspection finished.
    pub async fn run_with_events<S>(mut self, events: S, shutdown: CancellationToken)
    where
        S: Stream<Item = std::result::Result<Event<K>, watcher::Error>> + Send,
    {
        let mut events = std::pin::pin!(events);
        let mut slots: HashMap<ObjectKey, Arc<WorkerSlot<K>>> = HashMap::new();
        let mut workers: JoinSet<(ObjectKey, Arc<WorkerSlot<K>>)> = JoinSet::new();
        let mut watch_open = true;

        info!("Starting {} controller", K::KIND_LABEL);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.next(), if watch_open => match event {
                    Some(Ok(event)) => self.handle_event(event, &mut slots, &mut workers, &shutdown),
                    Some(Err(e)) => warn!("{} watch error: {}", K::KIND_LABEL, e),
                    None => {
                        warn!("{} watch stream ended", K::KIND_LABEL);
                        watch_open = false;
                    }
                },
                Some(key) = self.recheck_rx.recv() => match slots.get(&key) {
                    Some(slot) => {
                        debug!("Manual recheck of {}", key);
                        slot.trigger.trigger();
                    }
                    None => debug!("Ignoring recheck of unknown object {}", key),
                },
                Some(joined) = workers.join_next(), if !workers.is_empty() => match joined {
                    Ok((key, slot)) => {
                        if slots.get(&key).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
                            if slot.is_deleted() || shutdown.is_cancelled() {
                                slots.remove(&key);
                                debug!("Forgot {} {}", K::KIND_LABEL, key);
                            } else {
                                // Object was recreated after its worker decided to stop
                                self.spawn_worker(key, slot, &mut workers, &shutdown);
                            }
                        }
                        metrics::set_watched_objects(K::KIND_LABEL, slots.len());
                    }
                    Err(e) => error!("{} worker task failed: {}", K::KIND_LABEL, e),
                },
            }
        }

        info!(
            "Stopping {} controller, waiting for {} workers",
            K::KIND_LABEL,
            workers.len()
        );
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("{} worker task failed: {}", K::KIND_LABEL, e);
            }
        }
        info!("{} controller stopped", K::KIND_LABEL);
    }

    fn handle_event(
        &self,
        event: Event<K>,
        slots: &mut HashMap<ObjectKey, Arc<WorkerSlot<K>>>,
        workers: &mut JoinSet<(ObjectKey, Arc<WorkerSlot<K>>)>,
        shutdown: &CancellationToken,
    ) {
        match event {
            Event::Apply(object) | Event::InitApply(object) => {
                let key = ObjectKey::from_object(&object);
                match slots.get(&key) {
                    Some(slot) => {
                        // Recreated while the old worker still runs: hand the new object to it
                        slot.replace(Arc::new(object));
                        slot.restore();
                        slot.trigger.trigger();
                    }
                    None => {
                        let slot = Arc::new(WorkerSlot::new(Arc::new(object)));
                        self.spawn_worker(key.clone(), slot.clone(), workers, shutdown);
                        slots.insert(key, slot);
                    }
                }
            }
            Event::Delete(object) => {
                let key = ObjectKey::from_object(&object);
                let has_finalizer = object.has_finalizer();
                match slots.get(&key) {
                    Some(slot) => {
                        slot.replace(Arc::new(object));
                        slot.mark_deleted();
                        slot.trigger.trigger();
                    }
                    None if has_finalizer => {
                        // Finalizers still have to run once before the object is forgotten
                        let slot = Arc::new(WorkerSlot::new(Arc::new(object)));
                        slot.mark_deleted();
                        self.spawn_worker(key.clone(), slot.clone(), workers, shutdown);
                        slots.insert(key, slot);
                    }
                    None => {}
                }
            }
            Event::Init => debug!("{} watch (re)listing", K::KIND_LABEL),
            Event::InitDone => {
                if !self.readiness.is_ready() {
                    info!("{} controller completed initial sync", K::KIND_LABEL);
                }
                self.readiness.set_ready(true);
            }
        }
        metrics::set_watched_objects(K::KIND_LABEL, slots.len());
    }

    fn spawn_worker(
        &self,
        key: ObjectKey,
        slot: Arc<WorkerSlot<K>>,
        workers: &mut JoinSet<(ObjectKey, Arc<WorkerSlot<K>>)>,
        shutdown: &CancellationToken,
    ) {
        debug!("Tracking {} {}", K::KIND_LABEL, key);
        workers.spawn(run_worker(
            key,
            slot,
            self.inspector.clone(),
            self.intervals,
            shutdown.clone(),
        ));
    }
}

async fn run_worker<K, I>(
    key: ObjectKey,
    slot: Arc<WorkerSlot<K>>,
    inspector: Arc<I>,
    intervals: InspectionIntervals,
    shutdown: CancellationToken,
) -> (ObjectKey, Arc<WorkerSlot<K>>)
where
    K: ManagedResource,
    I: Inspector<K>,
{
    let mut entry = ScheduleEntry::new(intervals.max);

    loop {
        let deleted = slot.is_deleted();
        let mut object = slot.object();
        if deleted {
            if !object.has_finalizer() {
                break;
            }
            // Whatever the event carried, a deleted object is terminating
            if object.meta().deletion_timestamp.is_none() {
                let mut terminating = (*object).clone();
                terminating.meta_mut().deletion_timestamp = Some(Time(chrono::Utc::now()));
                object = Arc::new(terminating);
            }
        }

        let mut released = false;
        match inspect_guarded(&key, object, inspector.as_ref(), &mut entry, &shutdown).await {
            Ok(Outcome::Requeue(next)) => {
                let next = entry.reschedule(next, &intervals);
                debug!("Next inspection of {} {} in {:?}", K::KIND_LABEL, key, next);
            }
            Ok(Outcome::Released) => released = true,
            Err(e) => {
                let next = entry.reschedule(entry.interval, &intervals);
                error!(
                    "Inspection of {} {} failed: {}, retrying in {:?}",
                    K::KIND_LABEL,
                    key,
                    e,
                    next
                );
            }
        }

        if deleted && slot.is_deleted() {
            // One last inspection is all a vanished object gets
            break;
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = slot.trigger.triggered() => {}
            _ = sleep_until(entry.next_due), if !released => {}
        }
    }

    (key, slot)
}

async fn inspect_guarded<K, I>(
    key: &ObjectKey,
    object: Arc<K>,
    inspector: &I,
    entry: &mut ScheduleEntry,
    shutdown: &CancellationToken,
) -> Result<Outcome>
where
    K: ManagedResource,
    I: Inspector<K>,
{
    let started = Instant::now();
    let mut inspection = Inspection {
        last_interval: entry.interval,
        error_streak: &mut entry.error_streak,
        shutdown,
    };

    let result = AssertUnwindSafe(inspector.inspect(object, &mut inspection))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("Inspection of {} {} panicked: {}", K::KIND_LABEL, key, message);
            Err(OperatorError::InspectionPanicked(message))
        });

    metrics::record_inspection(K::KIND_LABEL, started.elapsed(), result.is_ok());
    result
}
