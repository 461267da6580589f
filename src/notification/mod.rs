//! Notification data model.
//!
//! A [`Notification`] is created from a [`ToastSpec`] and never mutated
//! afterwards; it only ever leaves the collection for one of the
//! [`RemovalReason`]s.

mod types;

pub use types::{
    Notification, NotificationId, RemovalReason, Severity, ToastAction, ToastEvent, ToastSpec,
};
