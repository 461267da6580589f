//! Prometheus metrics for the notification subsystem.
//!
//! - Notification metrics (shown by severity, removed by reason, active count)
//! - Scheduler metrics (pending auto-dismiss timers)
//!
//! Counters live in the default registry and are shared by every subsystem
//! instance in the process.

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter_vec, register_int_gauge, Encoder, IntCounterVec, IntGauge, TextEncoder,
};

use crate::notification::{RemovalReason, Severity};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "toast";

lazy_static! {
    /// Notifications shown, by severity
    pub static ref NOTIFICATIONS_SHOWN_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_shown_total", METRIC_PREFIX),
        "Total notifications shown",
        &["severity"]
    ).unwrap();

    /// Notifications removed, by reason
    pub static ref NOTIFICATIONS_REMOVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_removed_total", METRIC_PREFIX),
        "Total notifications removed",
        &["reason"]
    ).unwrap();

    /// Notifications currently held across all instances
    pub static ref NOTIFICATIONS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_notifications_active", METRIC_PREFIX),
        "Number of active notifications"
    ).unwrap();

    /// Armed auto-dismiss timers
    pub static ref TIMERS_PENDING: IntGauge = register_int_gauge!(
        format!("{}_timers_pending", METRIC_PREFIX),
        "Number of pending auto-dismiss timers"
    ).unwrap();
}

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording notification lifecycle metrics
pub struct NotificationMetrics;

impl NotificationMetrics {
    pub fn record_shown(severity: Severity) {
        NOTIFICATIONS_SHOWN_TOTAL
            .with_label_values(&[severity.as_str()])
            .inc();
        NOTIFICATIONS_ACTIVE.inc();
    }

    pub fn record_removed(reason: RemovalReason, count: u64) {
        if count == 0 {
            return;
        }
        NOTIFICATIONS_REMOVED_TOTAL
            .with_label_values(&[reason.as_str()])
            .inc_by(count);
        NOTIFICATIONS_ACTIVE.sub(count as i64);
    }

    /// Notifications dropped together with their subsystem instance
    pub fn record_discarded(count: usize) {
        NOTIFICATIONS_ACTIVE.sub(count as i64);
    }
}

/// Helper struct for recording scheduler metrics
pub struct TimerMetrics;

impl TimerMetrics {
    pub fn record_armed() {
        TIMERS_PENDING.inc();
    }

    pub fn record_released(count: usize) {
        TIMERS_PENDING.sub(count as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_metrics() {
        NotificationMetrics::record_shown(Severity::Warning);
        NotificationMetrics::record_removed(RemovalReason::Expired, 1);
        NotificationMetrics::record_removed(RemovalReason::Cleared, 0);

        assert!(
            NOTIFICATIONS_SHOWN_TOTAL
                .with_label_values(&["warning"])
                .get()
                >= 1
        );
        assert!(
            NOTIFICATIONS_REMOVED_TOTAL
                .with_label_values(&["expired"])
                .get()
                >= 1
        );
    }

    #[test]
    fn test_encode_metrics() {
        TimerMetrics::record_armed();
        TimerMetrics::record_released(1);
        NotificationMetrics::record_shown(Severity::Info);
        NotificationMetrics::record_removed(RemovalReason::Dismissed, 1);

        let output = encode_metrics().unwrap();
        assert!(output.contains("toast_notifications_shown_total"));
        assert!(output.contains("toast_timers_pending"));
    }
}
