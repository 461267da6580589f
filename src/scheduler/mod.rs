//! Auto-dismiss timers.
//!
//! Each notification with a non-zero lifetime gets exactly one timer task,
//! keyed by its id. The abort handle stays in the map until the timer fires
//! or is cancelled, so every removal path can cancel it by id.

use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use crate::error::{Result, ToastError};
use crate::metrics::TimerMetrics;
use crate::notification::NotificationId;

pub struct DismissScheduler {
    runtime: Handle,
    timers: DashMap<NotificationId, AbortHandle>,
}

impl DismissScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            timers: DashMap::new(),
        }
    }

    /// Bind to the tokio runtime of the calling context
    pub fn current() -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| ToastError::NoRuntime)?;
        Ok(Self::new(runtime))
    }

    /// Arm a timer calling `on_expire(id)` once `delay` has elapsed.
    ///
    /// The callback must call [`complete`](Self::complete) for `id` so the
    /// entry is released. Arming an id twice keeps the first timer.
    pub fn arm<F>(&self, id: NotificationId, delay: Duration, on_expire: F)
    where
        F: FnOnce(NotificationId) + Send + 'static,
    {
        // The shard stays locked until the handle is stored, so a timer that
        // fires immediately cannot complete before it is registered.
        match self.timers.entry(id) {
            Entry::Occupied(_) => {
                tracing::warn!(notification_id = %id, "Timer already armed for notification");
            }
            Entry::Vacant(slot) => {
                let task = self.runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    on_expire(id);
                });
                slot.insert(task.abort_handle());
                TimerMetrics::record_armed();
                tracing::debug!(
                    notification_id = %id,
                    delay_ms = delay.as_millis() as u64,
                    "Auto-dismiss timer armed"
                );
            }
        }
    }

    /// Abort the pending timer for `id`. Returns false if none was armed.
    pub fn cancel(&self, id: NotificationId) -> bool {
        match self.timers.remove(&id) {
            Some((_, handle)) => {
                handle.abort();
                TimerMetrics::record_released(1);
                tracing::debug!(notification_id = %id, "Auto-dismiss timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Release the entry of a timer that has fired
    pub fn complete(&self, id: NotificationId) -> bool {
        let released = self.timers.remove(&id).is_some();
        if released {
            TimerMetrics::record_released(1);
        }
        released
    }

    /// Abort every pending timer
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<NotificationId> = self.timers.iter().map(|entry| *entry.key()).collect();
        ids.into_iter().filter(|id| self.cancel(*id)).count()
    }

    pub fn is_armed(&self, id: NotificationId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for DismissScheduler {
    fn drop(&mut self) {
        let cancelled = self.cancel_all();
        if cancelled > 0 {
            tracing::debug!(cancelled = cancelled, "Cancelled pending timers on drop");
        }
    }
}
