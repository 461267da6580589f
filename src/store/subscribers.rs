//! Snapshot listeners and their unsubscribe handles

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use super::Snapshot;

type Listener = Box<dyn Fn(&Snapshot) + Send + Sync>;

struct ListenerSlot {
    callback: Listener,
    /// Highest snapshot version delivered so far
    last_version: AtomicU64,
    /// Cleared on removal; a delivery already in flight checks it before each call
    active: AtomicBool,
}

/// Registered snapshot listeners, keyed by an increasing id and called in
/// registration order
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    slots: DashMap<u64, Arc<ListenerSlot>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            slots: DashMap::new(),
        }
    }

    /// Register a listener that has already seen `current_version`
    pub(crate) fn register<F>(&self, listener: F, current_version: u64) -> u64
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.slots.insert(
            id,
            Arc::new(ListenerSlot {
                callback: Box::new(listener),
                last_version: AtomicU64::new(current_version),
                active: AtomicBool::new(true),
            }),
        );
        tracing::debug!(listener_id = id, "Snapshot listener registered");
        id
    }

    pub(crate) fn remove(&self, id: u64) -> bool {
        match self.slots.remove(&id) {
            Some((_, slot)) => {
                slot.active.store(false, Ordering::Release);
                tracing::debug!(listener_id = id, "Snapshot listener removed");
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.slots.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Hand `snapshot` to every listener that has not yet seen it or a newer one.
    ///
    /// Slots are collected first so no map guard is held while user code runs;
    /// a listener may therefore subscribe, unsubscribe or mutate the store.
    /// A listener removed after collection is skipped.
    pub(crate) fn deliver(&self, snapshot: &Snapshot) {
        let mut slots: Vec<(u64, Arc<ListenerSlot>)> = self
            .slots
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        slots.sort_unstable_by_key(|(id, _)| *id);

        let version = snapshot.version();
        for (_, slot) in slots {
            if !slot.active.load(Ordering::Acquire) {
                continue;
            }
            if slot.last_version.fetch_max(version, Ordering::AcqRel) < version {
                (slot.callback)(snapshot);
            }
        }
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle unsubscribes the listener; `unsubscribe` may also be
/// called explicitly, any number of times.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {
    pub(crate) fn new(id: u64, registry: &Arc<ListenerRegistry>) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
        }
    }

    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains(self.id))
    }

    /// Keep the listener registered for the lifetime of the store
    pub fn detach(mut self) {
        self.registry = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn snapshot(version: u64) -> Snapshot {
        Snapshot::new(version, Vec::new())
    }

    #[test]
    fn test_deliver_skips_stale_versions() {
        let registry = ListenerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        registry.register(move |s: &Snapshot| sink.lock().unwrap().push(s.version()), 0);

        registry.deliver(&snapshot(2));
        registry.deliver(&snapshot(1));
        registry.deliver(&snapshot(2));
        registry.deliver(&snapshot(3));

        assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_deliver_follows_registration_order() {
        let registry = ListenerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let sink = seen.clone();
            registry.register(move |_: &Snapshot| sink.lock().unwrap().push(name), 0);
        }

        registry.deliver(&snapshot(1));
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_removed_during_delivery_is_not_called() {
        let registry = Arc::new(ListenerRegistry::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let victim = Arc::new(AtomicU64::new(0));

        let (sink, weak, target) = (seen.clone(), Arc::downgrade(&registry), victim.clone());
        registry.register(
            move |_: &Snapshot| {
                sink.lock().unwrap().push("remover");
                if let Some(registry) = weak.upgrade() {
                    registry.remove(target.load(Ordering::SeqCst));
                }
            },
            0,
        );
        let sink = seen.clone();
        let id = registry.register(move |_: &Snapshot| sink.lock().unwrap().push("removed"), 0);
        victim.store(id, Ordering::SeqCst);

        registry.deliver(&snapshot(1));
        registry.deliver(&snapshot(2));

        assert_eq!(*seen.lock().unwrap(), vec!["remover", "remover"]);
        assert!(!registry.contains(id));
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let registry = Arc::new(ListenerRegistry::new());
        let id = registry.register(|_: &Snapshot| {}, 0);
        let subscription = Subscription::new(id, &registry);

        assert!(subscription.is_active());
        subscription.unsubscribe();
        subscription.unsubscribe();
        assert!(!subscription.is_active());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let registry = Arc::new(ListenerRegistry::new());
        let id = registry.register(|_: &Snapshot| {}, 0);
        drop(Subscription::new(id, &registry));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_detach_keeps_listener() {
        let registry = Arc::new(ListenerRegistry::new());
        let id = registry.register(|_: &Snapshot| {}, 0);
        Subscription::new(id, &registry).detach();
        assert!(registry.contains(id));
    }
}
