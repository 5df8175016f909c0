//! Process start-up: configuration loading and tracing initialization.

pub mod config;
pub mod tracing;

pub use config::{load_config, AppConfig, LoggingConfig, PasswordlessConfig};
pub use self::tracing::init_tracing_subscriber;
