//! The one process-wide notification subsystem.
//!
//! Components that cannot be handed a [`Toaster`] explicitly use this handle
//! instead. It is empty until [`init`] is called during application startup
//! and empty again after [`shutdown`]; every call made while it is empty
//! returns [`ToastError::NotInitialized`].

use std::sync::{PoisonError, RwLock};

use crate::config::ToastConfig;
use crate::error::{Result, ToastError};
use crate::notification::{NotificationId, Severity, ToastSpec};
use crate::toaster::Toaster;

static GLOBAL: RwLock<Option<Toaster>> = RwLock::new(None);

/// Construct the process-wide subsystem on the current tokio runtime
pub fn init(config: ToastConfig) -> Result<Toaster> {
    let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return Err(ToastError::AlreadyInitialized);
    }

    let toaster = Toaster::new(config)?;
    *slot = Some(toaster.clone());
    Ok(toaster)
}

/// Clone of the process-wide handle
pub fn get() -> Result<Toaster> {
    GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or(ToastError::NotInitialized)
}

pub fn is_initialized() -> bool {
    GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}

pub fn show(spec: ToastSpec) -> Result<NotificationId> {
    get()?.show(spec)
}

pub fn notify(severity: Severity, title: impl Into<String>, detail: Option<&str>) -> Result<NotificationId> {
    get()?.notify(severity, title, detail)
}

pub fn success(title: impl Into<String>, detail: Option<&str>) -> Result<NotificationId> {
    notify(Severity::Success, title, detail)
}

pub fn error(title: impl Into<String>, detail: Option<&str>) -> Result<NotificationId> {
    notify(Severity::Error, title, detail)
}

pub fn warning(title: impl Into<String>, detail: Option<&str>) -> Result<NotificationId> {
    notify(Severity::Warning, title, detail)
}

pub fn info(title: impl Into<String>, detail: Option<&str>) -> Result<NotificationId> {
    notify(Severity::Info, title, detail)
}

pub fn dismiss(id: NotificationId) -> Result<bool> {
    get()?.dismiss(id)
}

pub fn dismiss_all() -> Result<usize> {
    get()?.dismiss_all()
}

/// Tear down the process-wide subsystem. Returns `NotInitialized` if there is none.
pub fn shutdown() -> Result<usize> {
    let toaster = GLOBAL
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
        .ok_or(ToastError::NotInitialized)?;
    Ok(toaster.shutdown())
}
