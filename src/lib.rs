// Infrastructure (shared components)
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Domain (notification lifecycle)
pub mod notification;
pub mod scheduler;
pub mod store;

// Application-facing API
pub mod global;
pub mod toaster;

pub use crate::config::{Settings, ToastConfig};
pub use crate::error::{Result, ToastError};
pub use crate::notification::{
    Notification, NotificationId, RemovalReason, Severity, ToastAction, ToastEvent, ToastSpec,
};
pub use crate::store::{Snapshot, Subscription};
pub use crate::toaster::{Toaster, ToasterStats};
