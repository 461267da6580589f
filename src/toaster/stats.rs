//! Lifecycle counters of a subsystem instance

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::notification::RemovalReason;

#[derive(Default)]
pub(crate) struct Counters {
    shown: AtomicU64,
    dismissed: AtomicU64,
    expired: AtomicU64,
    evicted: AtomicU64,
    cleared: AtomicU64,
    actions: AtomicU64,
}

impl Counters {
    pub(crate) fn record_shown(&self) {
        self.shown.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_removed(&self, reason: RemovalReason, count: u64) {
        let counter = match reason {
            RemovalReason::Dismissed => &self.dismissed,
            RemovalReason::Expired => &self.expired,
            RemovalReason::Evicted => &self.evicted,
            RemovalReason::Cleared => &self.cleared,
            RemovalReason::Action => &self.actions,
        };
        counter.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn load(&self) -> CounterValues {
        CounterValues {
            shown: self.shown.load(Ordering::Relaxed),
            dismissed: self.dismissed.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            cleared: self.cleared.load(Ordering::Relaxed),
            actions: self.actions.load(Ordering::Relaxed),
        }
    }
}

pub(crate) struct CounterValues {
    pub shown: u64,
    pub dismissed: u64,
    pub expired: u64,
    pub evicted: u64,
    pub cleared: u64,
    pub actions: u64,
}

/// Point-in-time statistics of a subsystem instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToasterStats {
    /// Notifications shown since construction
    pub shown: u64,
    /// Removed by explicit dismissal
    pub dismissed: u64,
    /// Removed because their lifetime elapsed
    pub expired: u64,
    /// Dropped on overflow
    pub evicted: u64,
    /// Removed by bulk clear or shutdown
    pub cleared: u64,
    /// Removed after their action was invoked
    pub actions: u64,
    /// Currently held notifications
    pub active: usize,
    /// Armed auto-dismiss timers
    pub pending_timers: usize,
    /// Registered snapshot listeners
    pub listeners: usize,
}
