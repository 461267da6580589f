//! Public entry point of the notification subsystem.
//!
//! [`Toaster`] wires the [`NotificationStore`] to the [`DismissScheduler`]
//! and is the only way notifications are created or removed. It is a cheap
//! cloneable handle; all clones share one collection.
//!
//! Every removal path (dismiss, action, expiry, eviction, clear, shutdown)
//! goes through the same internal routine, which cancels the timer of the
//! removed notification. No timer outlives its notification.

mod stats;

pub use stats::ToasterStats;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};

use crate::config::ToastConfig;
use crate::error::{Result, ToastError};
use crate::metrics::NotificationMetrics;
use crate::notification::{
    Notification, NotificationId, RemovalReason, Severity, ToastEvent, ToastSpec,
};
use crate::scheduler::DismissScheduler;
use crate::store::{NotificationStore, Snapshot, Subscription};
use stats::Counters;

struct Inner {
    config: ToastConfig,
    store: NotificationStore,
    scheduler: DismissScheduler,
    events: broadcast::Sender<ToastEvent>,
    open: AtomicBool,
    counters: Counters,
}

impl Inner {
    fn remove(&self, id: NotificationId, reason: RemovalReason) -> bool {
        self.scheduler.cancel(id);
        match self.store.remove(id) {
            Some(removed) => {
                self.record_removal(&[removed], reason);
                true
            }
            None => false,
        }
    }

    /// Timer callback: exactly one removal
    fn expire(&self, id: NotificationId) {
        self.scheduler.complete(id);
        if let Some(removed) = self.store.remove(id) {
            self.record_removal(&[removed], RemovalReason::Expired);
        }
    }

    fn clear(&self) -> usize {
        let removed = self.store.clear();
        for notification in &removed {
            self.scheduler.cancel(notification.id());
        }
        self.record_removal(&removed, RemovalReason::Cleared);
        removed.len()
    }

    fn record_removal(&self, removed: &[Notification], reason: RemovalReason) {
        self.account_removal(removed, reason);
        self.emit_removed(removed, reason);
    }

    /// Counters, metrics and logs for removed notifications
    fn account_removal(&self, removed: &[Notification], reason: RemovalReason) {
        if removed.is_empty() {
            return;
        }

        self.counters.record_removed(reason, removed.len() as u64);
        NotificationMetrics::record_removed(reason, removed.len() as u64);

        for notification in removed {
            if reason == RemovalReason::Evicted {
                tracing::warn!(
                    notification_id = %notification.id(),
                    severity = %notification.severity(),
                    capacity = self.store.capacity(),
                    "Notification evicted to stay within capacity"
                );
            } else {
                tracing::debug!(
                    notification_id = %notification.id(),
                    reason = reason.as_str(),
                    "Notification removed"
                );
            }
        }
    }

    fn emit_removed(&self, removed: &[Notification], reason: RemovalReason) {
        for notification in removed {
            let _ = self.events.send(ToastEvent::Removed {
                id: notification.id(),
                reason,
            });
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        NotificationMetrics::record_discarded(self.store.len());
    }
}

/// Handle to one notification subsystem instance
#[derive(Clone)]
pub struct Toaster {
    inner: Arc<Inner>,
}

impl Toaster {
    /// Construct a subsystem bound to the current tokio runtime.
    ///
    /// Fails with `InvalidConfiguration` or `NoRuntime`; nothing is left
    /// behind on failure.
    pub fn new(config: ToastConfig) -> Result<Self> {
        config.validate()?;
        let scheduler = DismissScheduler::current()?;
        Ok(Self::build(config, scheduler))
    }

    /// Construct a subsystem whose timers run on `runtime`
    pub fn with_runtime(config: ToastConfig, runtime: Handle) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, DismissScheduler::new(runtime)))
    }

    fn build(config: ToastConfig, scheduler: DismissScheduler) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer);

        tracing::info!(
            capacity = config.capacity,
            default_lifetime_ms = config.default_lifetime_ms,
            error_lifetime_ms = config.error_lifetime_ms,
            "Notification subsystem initialized"
        );

        Self {
            inner: Arc::new(Inner {
                store: NotificationStore::new(config.capacity),
                config,
                scheduler,
                events,
                open: AtomicBool::new(true),
                counters: Counters::default(),
            }),
        }
    }

    pub fn config(&self) -> &ToastConfig {
        &self.inner.config
    }

    /// Whether the subsystem accepts calls (not shut down)
    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ToastError::NotInitialized)
        }
    }

    /// Lifetime applied when a notification does not set one
    pub fn default_lifetime_ms(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Error => self.inner.config.error_lifetime_ms,
            _ => self.inner.config.default_lifetime_ms,
        }
    }

    /// Show a notification described by `spec` and arm its auto-dismiss timer
    pub fn show(&self, spec: ToastSpec) -> Result<NotificationId> {
        self.ensure_open()?;

        let default_lifetime_ms = self.default_lifetime_ms(spec.severity());
        // Events go out under the store lock, so `Shown` precedes any removal of
        // the same id, including one made by a listener reacting to this insert
        let inserted = self.inner.store.insert_with(
            spec.build(default_lifetime_ms),
            |notification, evicted| {
                self.inner.emit_removed(evicted, RemovalReason::Evicted);
                let _ = self.inner.events.send(ToastEvent::Shown {
                    notification: notification.clone(),
                });
            },
        );
        let notification = inserted.notification;
        let id = notification.id();

        self.inner.counters.record_shown();
        NotificationMetrics::record_shown(notification.severity());
        tracing::debug!(
            notification_id = %id,
            severity = %notification.severity(),
            lifetime_ms = notification.lifetime_ms(),
            "Notification shown"
        );

        for evicted in &inserted.evicted {
            self.inner.scheduler.cancel(evicted.id());
        }
        self.inner
            .account_removal(&inserted.evicted, RemovalReason::Evicted);

        if let Some(lifetime) = notification.lifetime() {
            let inner: Weak<Inner> = Arc::downgrade(&self.inner);
            self.inner.scheduler.arm(id, lifetime, move |id| {
                if let Some(inner) = inner.upgrade() {
                    inner.expire(id);
                }
            });
            // A concurrent clear or eviction may have removed it before the timer existed
            if !self.inner.store.contains(id) {
                self.inner.scheduler.cancel(id);
            }
        }

        Ok(id)
    }

    /// Show a notification with the severity default lifetime
    pub fn notify(
        &self,
        severity: Severity,
        title: impl Into<String>,
        detail: Option<&str>,
    ) -> Result<NotificationId> {
        self.show(ToastSpec::new(severity, title).maybe_detail(detail))
    }

    pub fn success(&self, title: impl Into<String>, detail: Option<&str>) -> Result<NotificationId> {
        self.notify(Severity::Success, title, detail)
    }

    pub fn error(&self, title: impl Into<String>, detail: Option<&str>) -> Result<NotificationId> {
        self.notify(Severity::Error, title, detail)
    }

    pub fn warning(&self, title: impl Into<String>, detail: Option<&str>) -> Result<NotificationId> {
        self.notify(Severity::Warning, title, detail)
    }

    pub fn info(&self, title: impl Into<String>, detail: Option<&str>) -> Result<NotificationId> {
        self.notify(Severity::Info, title, detail)
    }

    /// Remove a notification and cancel its timer.
    ///
    /// Returns `Ok(false)` when the id is not present; dismissing twice is fine.
    pub fn dismiss(&self, id: NotificationId) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.inner.remove(id, RemovalReason::Dismissed))
    }

    /// Remove every notification and cancel their timers
    pub fn dismiss_all(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.inner.clear())
    }

    /// Run the action attached to `id`, then dismiss it.
    ///
    /// Returns `Ok(false)` when the notification is gone or has no action.
    pub fn invoke_action(&self, id: NotificationId) -> Result<bool> {
        self.ensure_open()?;

        let Some(action) = self
            .inner
            .store
            .get(id)
            .and_then(|n| n.action().cloned())
        else {
            return Ok(false);
        };

        tracing::debug!(notification_id = %id, label = action.label(), "Invoking notification action");
        action.run();
        self.inner.remove(id, RemovalReason::Action);
        Ok(true)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.store.snapshot()
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.inner.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    /// Whether an auto-dismiss timer is pending for `id`
    pub fn has_timer(&self, id: NotificationId) -> bool {
        self.inner.scheduler.is_armed(id)
    }

    /// Call `listener` with the full snapshot after every change
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.inner.store.subscribe(listener)
    }

    /// Latest-snapshot receiver for async consumers
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.inner.store.watch()
    }

    /// Stream of lifecycle events, including evictions
    pub fn events(&self) -> broadcast::Receiver<ToastEvent> {
        self.inner.events.subscribe()
    }

    pub fn stats(&self) -> ToasterStats {
        let counters = self.inner.counters.load();
        ToasterStats {
            shown: counters.shown,
            dismissed: counters.dismissed,
            expired: counters.expired,
            evicted: counters.evicted,
            cleared: counters.cleared,
            actions: counters.actions,
            active: self.inner.store.len(),
            pending_timers: self.inner.scheduler.pending(),
            listeners: self.inner.store.listener_count(),
        }
    }

    /// Close the scope: clear the collection and cancel every timer.
    ///
    /// Later facade calls return `NotInitialized`. Calling it again is a no-op.
    #[tracing::instrument(name = "toaster_shutdown", skip(self))]
    pub fn shutdown(&self) -> usize {
        if !self.inner.open.swap(false, Ordering::AcqRel) {
            return 0;
        }

        let cleared = self.inner.clear();
        let cancelled = self.inner.scheduler.cancel_all();

        tracing::info!(
            cleared = cleared,
            cancelled_timers = cancelled,
            "Notification subsystem shut down"
        );

        cleared
    }
}

impl std::fmt::Debug for Toaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toaster")
            .field("config", &self.inner.config)
            .field("open", &self.is_open())
            .field("active", &self.inner.store.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    fn toaster(capacity: usize) -> Toaster {
        Toaster::new(ToastConfig::with_capacity(capacity)).unwrap()
    }

    fn titles(toaster: &Toaster) -> Vec<String> {
        toaster
            .snapshot()
            .iter()
            .map(|n| n.title().to_string())
            .collect()
    }

    #[test]
    fn test_new_requires_runtime() {
        let result = Toaster::new(ToastConfig::default());
        assert!(matches!(result, Err(ToastError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_invalid_capacity_rejected() {
        let result = Toaster::new(ToastConfig::with_capacity(0));
        assert!(matches!(result, Err(ToastError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_severity_default_lifetimes() {
        let toaster = toaster(10);
        let error = toaster.error("x", None).unwrap();
        let info = toaster.info("x", None).unwrap();
        let success = toaster.success("x", None).unwrap();
        let warning = toaster.warning("x", Some("detail")).unwrap();

        assert_eq!(toaster.get(error).unwrap().lifetime_ms(), 8000);
        assert_eq!(toaster.get(info).unwrap().lifetime_ms(), 5000);
        assert_eq!(toaster.get(success).unwrap().lifetime_ms(), 5000);
        assert_eq!(toaster.get(warning).unwrap().lifetime_ms(), 5000);
        assert_eq!(toaster.get(warning).unwrap().detail(), Some("detail"));
    }

    #[tokio::test]
    async fn test_explicit_lifetime_overrides_default() {
        let toaster = toaster(5);
        let id = toaster
            .show(ToastSpec::error("x").lifetime_ms(1200))
            .unwrap();
        assert_eq!(toaster.get(id).unwrap().lifetime_ms(), 1200);
    }

    #[tokio::test]
    async fn test_persistent_notification_has_no_timer() {
        let toaster = toaster(5);
        let id = toaster.show(ToastSpec::info("sticky").persistent()).unwrap();

        assert!(!toaster.has_timer(id));
        assert_eq!(toaster.stats().pending_timers, 0);
    }

    #[tokio::test]
    async fn test_eviction_cancels_timer() {
        let toaster = toaster(1);
        let first = toaster.info("a", None).unwrap();
        assert!(toaster.has_timer(first));

        toaster.info("b", None).unwrap();
        assert!(!toaster.has_timer(first));
        assert_eq!(toaster.stats().pending_timers, 1);
        assert_eq!(toaster.stats().evicted, 1);
        assert_eq!(titles(&toaster), vec!["b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_expires_notification() {
        let toaster = toaster(5);
        let id = toaster.success("saved", None).unwrap();

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert!(toaster.get(id).is_some());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(toaster.get(id).is_none());
        assert_eq!(toaster.stats().expired, 1);
        assert_eq!(toaster.stats().pending_timers, 0);
    }

    #[tokio::test]
    async fn test_dismiss_is_idempotent() {
        let toaster = toaster(5);
        let id = toaster.info("a", None).unwrap();

        assert!(toaster.dismiss(id).unwrap());
        assert!(!toaster.dismiss(id).unwrap());
        assert!(!toaster.has_timer(id));
        assert_eq!(toaster.stats().dismissed, 1);
    }

    #[tokio::test]
    async fn test_invoke_action_runs_effect_then_dismisses() {
        let toaster = toaster(5);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let id = toaster
            .show(ToastSpec::info("Draft restored").action("Undo", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        assert!(toaster.invoke_action(id).unwrap());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(toaster.get(id).is_none());
        assert!(!toaster.has_timer(id));
        assert_eq!(toaster.stats().actions, 1);

        assert!(!toaster.invoke_action(id).unwrap());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invoke_action_without_action() {
        let toaster = toaster(5);
        let id = toaster.info("plain", None).unwrap();

        assert!(!toaster.invoke_action(id).unwrap());
        assert!(toaster.get(id).is_some());
    }

    #[tokio::test]
    async fn test_events_report_evictions() {
        let toaster = toaster(1);
        let mut events = toaster.events();
        let first = toaster.info("a", None).unwrap();
        toaster.info("b", None).unwrap();

        assert!(matches!(events.recv().await.unwrap(), ToastEvent::Shown { .. }));
        match events.recv().await.unwrap() {
            ToastEvent::Removed { id, reason } => {
                assert_eq!(id, first);
                assert_eq!(reason, RemovalReason::Evicted);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(events.recv().await.unwrap(), ToastEvent::Shown { .. }));
    }

    #[tokio::test]
    async fn test_shown_precedes_removal_by_listener() {
        let toaster = toaster(5);
        let mut events = toaster.events();
        let handle = toaster.clone();
        let _subscription = toaster.subscribe(move |snapshot: &Snapshot| {
            for n in snapshot.iter() {
                let _ = handle.dismiss(n.id());
            }
        });

        let id = toaster.info("x", None).unwrap();
        assert!(toaster.is_empty());

        let mut order = Vec::new();
        while let Ok(event) = events.try_recv() {
            match event {
                ToastEvent::Shown { notification } => {
                    assert_eq!(notification.id(), id);
                    order.push("shown");
                }
                ToastEvent::Removed { id: removed, reason } => {
                    assert_eq!(removed, id);
                    assert_eq!(reason, RemovalReason::Dismissed);
                    order.push("removed");
                }
            }
        }
        assert_eq!(order, vec!["shown", "removed"]);
    }

    #[tokio::test]
    async fn test_listener_may_dismiss_reentrantly() {
        let toaster = toaster(5);
        let handle = toaster.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = toaster.subscribe(move |snapshot: &Snapshot| {
            sink.lock().unwrap().push(snapshot.len());
            for n in snapshot.iter().filter(|n| n.title() == "auto-ack") {
                let _ = handle.dismiss(n.id());
            }
        });

        toaster.info("auto-ack", None).unwrap();
        assert!(toaster.is_empty());
        assert_eq!(*seen.lock().unwrap(), vec![1, 0]);
    }

    #[tokio::test]
    async fn test_shutdown_closes_scope() {
        let toaster = toaster(5);
        toaster.info("a", None).unwrap();
        toaster.error("b", None).unwrap();

        assert_eq!(toaster.shutdown(), 2);
        assert_eq!(toaster.shutdown(), 0);
        assert!(!toaster.is_open());
        assert_eq!(toaster.stats().pending_timers, 0);
        assert!(toaster.snapshot().is_empty());

        assert!(matches!(
            toaster.info("late", None),
            Err(ToastError::NotInitialized)
        ));
        assert!(matches!(
            toaster.dismiss(NotificationId::new()),
            Err(ToastError::NotInitialized)
        ));
        assert!(matches!(
            toaster.dismiss_all(),
            Err(ToastError::NotInitialized)
        ));
    }
}
