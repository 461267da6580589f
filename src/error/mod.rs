use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToastError {
    /// The facade was used outside a live subsystem scope: before the
    /// process-wide handle was initialized, or after `shutdown()`.
    #[error("Notification subsystem is not initialized")]
    NotInitialized,

    #[error("Notification subsystem is already initialized")]
    AlreadyInitialized,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Timers are spawned on the tokio runtime captured at construction.
    #[error("No tokio runtime available to schedule auto-dismiss timers")]
    NoRuntime,

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ToastError {
    /// Short machine-readable code, used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            ToastError::NotInitialized => "NOT_INITIALIZED",
            ToastError::AlreadyInitialized => "ALREADY_INITIALIZED",
            ToastError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            ToastError::NoRuntime => "NO_RUNTIME",
            ToastError::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, ToastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ToastError::NotInitialized.to_string(),
            "Notification subsystem is not initialized"
        );
        assert_eq!(
            ToastError::InvalidConfiguration("capacity must be greater than 0".into()).to_string(),
            "Invalid configuration: capacity must be greater than 0"
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ToastError::NotInitialized.code(), "NOT_INITIALIZED");
        assert_eq!(ToastError::NoRuntime.code(), "NO_RUNTIME");
        assert_eq!(
            ToastError::InvalidConfiguration(String::new()).code(),
            "INVALID_CONFIGURATION"
        );
    }
}
