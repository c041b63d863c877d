//! Subscription bookkeeping shared by the simulated and replayed platforms

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;

use contracts::{RawEvent, RawEventCallback, SubscriptionId, SubscriptionRequest};
use tracing::{debug, warn};

struct Subscription {
    request: SubscriptionRequest,
    callback: RawEventCallback,
    /// Background producer of this subscription, if any
    producer: Option<(Arc<AtomicBool>, JoinHandle<()>)>,
}

/// Active subscriptions plus call counters
#[derive(Default)]
pub struct SubscriptionTable {
    next_id: AtomicU64,
    active: Mutex<BTreeMap<SubscriptionId, Subscription>>,
    /// Held shared while callbacks run; `remove` takes it exclusively
    dispatching: RwLock<()>,
    subscribe_calls: AtomicU64,
    unsubscribe_calls: AtomicU64,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a subscribe attempt, successful or not
    pub fn note_subscribe_call(&self) {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Store a new subscription and return its id
    pub fn insert(&self, request: SubscriptionRequest, callback: RawEventCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.lock().insert(
            id,
            Subscription {
                request,
                callback,
                producer: None,
            },
        );
        id
    }

    /// Attach a producer thread that stops when `running` is cleared
    pub fn attach_producer(&self, id: SubscriptionId, running: Arc<AtomicBool>, handle: JoinHandle<()>) {
        let mut active = self.lock();
        match active.get_mut(&id) {
            Some(subscription) => subscription.producer = Some((running, handle)),
            None => running.store(false, Ordering::SeqCst),
        }
    }

    /// Remove a subscription; after this returns its callback is not invoked again
    ///
    /// Waits for dispatches already running, so it must not be called from
    /// inside a callback.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        let removed = self.lock().remove(&id);
        let Some(subscription) = removed else {
            debug!(id = %id, "Unknown subscription ignored");
            return false;
        };

        if let Some((running, handle)) = subscription.producer {
            running.store(false, Ordering::SeqCst);
            if handle.join().is_err() {
                warn!(id = %id, "Producer thread panicked");
            }
        }
        // a dispatch may have cloned the callback before it left the map
        drop(
            self.dispatching
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        true
    }

    /// Deliver `event` to every subscription accepting it, on the caller's thread
    pub fn dispatch(&self, event: &RawEvent) -> usize {
        let _dispatching = self
            .dispatching
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let targets: Vec<RawEventCallback> = self
            .lock()
            .values()
            .filter(|s| s.request.accepts(event))
            .map(|s| Arc::clone(&s.callback))
            .collect();

        for callback in &targets {
            callback(event.clone());
        }
        targets.len()
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    pub fn requests(&self) -> Vec<SubscriptionRequest> {
        self.lock().values().map(|s| s.request.clone()).collect()
    }

    pub fn subscribe_calls(&self) -> u64 {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_calls(&self) -> u64 {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<SubscriptionId, Subscription>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SubscriptionTable {
    fn drop(&mut self) {
        let active = std::mem::take(
            self.active
                .get_mut()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        for (_, subscription) in active {
            if let Some((running, handle)) = subscription.producer {
                running.store(false, Ordering::SeqCst);
                let _ = handle.join();
            }
        }
    }
}
