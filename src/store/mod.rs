//! Bounded, ordered collection of active notifications.
//!
//! The store owns the collection exclusively. Readers only ever get a
//! [`Snapshot`]: an immutable, versioned copy of the collection in arrival
//! order. Every mutation that changes the collection publishes a new snapshot
//! to the watch channel and to every registered listener before returning.
//!
//! When an insertion pushes the collection past its capacity, the oldest
//! notifications are evicted first. Severity never affects eviction order.

mod subscribers;

pub use subscribers::Subscription;

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::watch;

use crate::notification::{Notification, NotificationId};
use subscribers::ListenerRegistry;

/// Read-only view of the collection at one instant
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    version: u64,
    notifications: Arc<[Notification]>,
}

impl Snapshot {
    pub(crate) fn new(version: u64, notifications: Vec<Notification>) -> Self {
        Self {
            version,
            notifications: notifications.into(),
        }
    }

    /// Monotonically increasing per store, bumped on every change
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn ids(&self) -> Vec<NotificationId> {
        self.notifications.iter().map(Notification::id).collect()
    }
}

impl Deref for Snapshot {
    type Target = [Notification];

    fn deref(&self) -> &Self::Target {
        &self.notifications
    }
}

/// Result of an insertion
#[derive(Debug)]
pub struct Inserted {
    pub notification: Notification,
    /// Notifications dropped to keep the collection within capacity, oldest first
    pub evicted: Vec<Notification>,
}

struct StoreState {
    items: VecDeque<Notification>,
    version: u64,
}

pub struct NotificationStore {
    capacity: usize,
    state: Mutex<StoreState>,
    snapshot_tx: watch::Sender<Snapshot>,
    listeners: Arc<ListenerRegistry>,
}

impl NotificationStore {
    /// Create an empty store. `capacity` must be non-zero; the caller validates it.
    pub fn new(capacity: usize) -> Self {
        let (snapshot_tx, _) = watch::channel(Snapshot::new(0, Vec::new()));
        Self {
            capacity,
            state: Mutex::new(StoreState {
                items: VecDeque::with_capacity(capacity + 1),
                version: 0,
            }),
            snapshot_tx,
            listeners: Arc::new(ListenerRegistry::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a notification, evicting from the front while over capacity
    pub fn insert(&self, notification: Notification) -> Inserted {
        self.insert_with(notification, |_, _| {})
    }

    /// Like [`insert`](Self::insert), but runs `on_inserted` with the new
    /// notification and the evicted ones while the state lock is still held.
    ///
    /// Anything `on_inserted` does is ordered before any later mutation and
    /// before listeners see the new snapshot. It must not call back into the store.
    pub fn insert_with<F>(&self, notification: Notification, on_inserted: F) -> Inserted
    where
        F: FnOnce(&Notification, &[Notification]),
    {
        let mut evicted = Vec::new();
        {
            let mut state = self.lock();
            state.items.push_back(notification.clone());
            while state.items.len() > self.capacity {
                if let Some(oldest) = state.items.pop_front() {
                    evicted.push(oldest);
                }
            }
            self.publish(&mut state);
            on_inserted(&notification, &evicted);
        }
        self.notify_listeners();

        Inserted {
            notification,
            evicted,
        }
    }

    /// Remove by id. Absent ids are a no-op and publish nothing.
    pub fn remove(&self, id: NotificationId) -> Option<Notification> {
        let removed = {
            let mut state = self.lock();
            let pos = state.items.iter().position(|n| n.id() == id)?;
            let removed = state.items.remove(pos);
            self.publish(&mut state);
            removed
        };
        self.notify_listeners();
        removed
    }

    /// Remove everything, returning the removed notifications in arrival order
    pub fn clear(&self) -> Vec<Notification> {
        let removed = {
            let mut state = self.lock();
            if state.items.is_empty() {
                return Vec::new();
            }
            let removed: Vec<Notification> = state.items.drain(..).collect();
            self.publish(&mut state);
            removed
        };
        self.notify_listeners();
        removed
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.lock().items.iter().find(|n| n.id() == id).cloned()
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.lock().items.iter().any(|n| n.id() == id)
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Register a listener called with the full snapshot after every change
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let current = self.snapshot_tx.borrow().version();
        let id = self.listeners.register(listener, current);
        Subscription::new(id, &self.listeners)
    }

    /// Receiver that always holds the latest snapshot, for async consumers
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Bump the version and replace the published snapshot. Runs under the state lock
    /// so published versions follow mutation order.
    fn publish(&self, state: &mut StoreState) {
        state.version += 1;
        let snapshot = Snapshot::new(state.version, state.items.iter().cloned().collect());
        self.snapshot_tx.send_replace(snapshot);
    }

    /// Deliver the latest snapshot outside the state lock
    fn notify_listeners(&self) {
        let latest = self.snapshot();
        self.listeners.deliver(&latest);
    }
}
