use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Unique identifier for a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Severity classification of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Effect = Arc<dyn Fn() + Send + Sync>;

/// Optional call-to-action attached to a notification.
///
/// Invoking the action always dismisses the notification afterwards.
#[derive(Clone, Serialize)]
pub struct ToastAction {
    label: String,
    #[serde(skip)]
    effect: Effect,
}

impl ToastAction {
    pub fn new<F>(label: impl Into<String>, effect: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            effect: Arc::new(effect),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn run(&self) {
        (self.effect)()
    }
}

impl fmt::Debug for ToastAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// An active notification. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    id: NotificationId,
    severity: Severity,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    /// 0 means the notification persists until dismissed
    lifetime_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<ToastAction>,
    created_at: DateTime<Utc>,
}

impl Notification {
    pub fn id(&self) -> NotificationId {
        self.id
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn lifetime_ms(&self) -> u64 {
        self.lifetime_ms
    }

    /// Auto-dismiss delay, `None` for persistent notifications
    pub fn lifetime(&self) -> Option<Duration> {
        (self.lifetime_ms > 0).then(|| Duration::from_millis(self.lifetime_ms))
    }

    pub fn is_persistent(&self) -> bool {
        self.lifetime_ms == 0
    }

    pub fn action(&self) -> Option<&ToastAction> {
        self.action.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Builder describing a notification to be shown
#[derive(Debug, Clone)]
pub struct ToastSpec {
    severity: Severity,
    title: String,
    detail: Option<String>,
    lifetime_ms: Option<u64>,
    action: Option<ToastAction>,
}

impl ToastSpec {
    pub fn new(severity: Severity, title: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            detail: None,
            lifetime_ms: None,
            action: None,
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(Severity::Success, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(Severity::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(Severity::Warning, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(Severity::Info, title)
    }

    /// Set the secondary text
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn maybe_detail(mut self, detail: Option<&str>) -> Self {
        self.detail = detail.map(str::to_owned);
        self
    }

    /// Override the severity default lifetime
    pub fn lifetime(self, lifetime: Duration) -> Self {
        self.lifetime_ms(lifetime.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn lifetime_ms(mut self, lifetime_ms: u64) -> Self {
        self.lifetime_ms = Some(lifetime_ms);
        self
    }

    /// Keep the notification until it is dismissed explicitly
    pub fn persistent(self) -> Self {
        self.lifetime_ms(0)
    }

    pub fn action<F>(mut self, label: impl Into<String>, effect: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.action = Some(ToastAction::new(label, effect));
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Materialize the notification with a fresh id, falling back to
    /// `default_lifetime_ms` when no explicit lifetime was set.
    pub(crate) fn build(self, default_lifetime_ms: u64) -> Notification {
        Notification {
            id: NotificationId::new(),
            severity: self.severity,
            title: self.title,
            detail: self.detail,
            lifetime_ms: self.lifetime_ms.unwrap_or(default_lifetime_ms),
            action: self.action,
            created_at: Utc::now(),
        }
    }
}

/// Why a notification left the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalReason {
    /// Explicit dismissal by id
    Dismissed,
    /// Lifetime elapsed
    Expired,
    /// Dropped to make room for a newer notification
    Evicted,
    /// Bulk clear or subsystem shutdown
    Cleared,
    /// The attached action was invoked
    Action,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::Dismissed => "dismissed",
            RemovalReason::Expired => "expired",
            RemovalReason::Evicted => "evicted",
            RemovalReason::Cleared => "cleared",
            RemovalReason::Action => "action",
        }
    }
}

/// Lifecycle event published on every insertion and removal
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToastEvent {
    Shown { notification: Notification },
    Removed { id: NotificationId, reason: RemovalReason },
}
