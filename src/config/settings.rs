use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::error::{Result, ToastError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub toasts: ToastConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Construction parameters of the notification subsystem.
#[derive(Debug, Clone, Deserialize)]
pub struct ToastConfig {
    /// Maximum number of notifications held at once; overflow evicts the oldest
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Lifetime applied to success/info/warning notifications (0 = persistent)
    #[serde(default = "default_lifetime_ms")]
    pub default_lifetime_ms: u64,
    /// Lifetime applied to error notifications (0 = persistent)
    #[serde(default = "default_error_lifetime_ms")]
    pub error_lifetime_ms: u64,
    /// Buffer size of the lifecycle event broadcast channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_capacity() -> usize {
    5
}

fn default_lifetime_ms() -> u64 {
    5000
}

fn default_error_lifetime_ms() -> u64 {
    8000
}

fn default_event_buffer() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> std::result::Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("toasts.capacity", default_capacity() as u64)?
            .set_default("toasts.default_lifetime_ms", default_lifetime_ms())?
            .set_default("toasts.error_lifetime_ms", default_error_lifetime_ms())?
            .set_default("toasts.event_buffer", default_event_buffer() as u64)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.json", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(environment());

        builder.build()?.try_deserialize()
    }

    /// Load settings and validate the subsystem section.
    pub fn load() -> Result<Self> {
        let settings = Self::new()?;
        settings.toasts.validate()?;
        Ok(settings)
    }
}

/// Environment source: `TOASTS__CAPACITY`, `TOASTS__DEFAULT_LIFETIME_MS`,
/// `LOGGING__LEVEL`, etc. The double underscore separates section from key,
/// so single underscores inside key names survive.
fn environment() -> Environment {
    Environment::default().separator("__").try_parsing(true)
}

impl ToastConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ToastError::InvalidConfiguration(
                "capacity must be greater than 0".to_string(),
            ));
        }
        if self.event_buffer == 0 {
            return Err(ToastError::InvalidConfiguration(
                "event_buffer must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            default_lifetime_ms: default_lifetime_ms(),
            error_lifetime_ms: default_error_lifetime_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
