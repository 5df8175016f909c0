//! Tracing configuration for the authflow binary.
//!
//! - **Environment filter**: respects `RUST_LOG`, otherwise debug in debug
//!   builds and info in release builds
//! - **Stderr layer**: always on, ChronoUtc timestamps with file and line
//! - **File layer**: optional, non-blocking, in the configured log directory
//!   or the platform data directory

use std::{fs, io, path::Path, path::PathBuf, sync::OnceLock};

use anyhow::Context;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, registry};

use super::config::LoggingConfig;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_FILE_NAME: &str = "authflow.log";

fn is_development() -> bool {
    cfg!(debug_assertions)
}

fn build_filter_directives(is_dev: bool) -> Vec<String> {
    let level = if is_dev { "debug" } else { "info" };
    vec![
        level.to_string(),
        format!("af_core={level}"),
        format!("af_app={level}"),
        format!("af_infra={level}"),
        "tokio=warn".to_string(),
    ]
}

/// Initialize the global tracing subscriber.
///
/// Call once from `main`, before the runtime starts. Logs go to stderr so
/// that stdout carries only replay output.
///
/// ## Errors
///
/// Returns `Err` if a subscriber is already registered.
pub fn init_tracing_subscriber(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter_directives = build_filter_directives(is_development());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter_directives.join(",")));

    let stderr_writer: BoxMakeWriter = BoxMakeWriter::new(io::stderr);
    let file_writer = if logging.file {
        match build_file_writer(&logging.dir) {
            Ok(writer) => Some(writer),
            Err(err) => {
                eprintln!("Failed to initialize file logging, falling back to stderr: {err:#}");
                None
            }
        }
    } else {
        None
    };

    // "2025-01-15 10:30:45.123 INFO [file.rs:42] [target] message"
    let stderr_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(
            "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        ))
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_ansi(cfg!(not(test)))
        .with_writer(stderr_writer);

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_timer(fmt::time::ChronoUtc::new(
                "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            ))
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    let subscriber = registry().with(env_filter).with(stderr_layer);

    if let Some(layer) = file_layer {
        subscriber.with(layer).try_init()?;
    } else {
        subscriber.try_init()?;
    }

    Ok(())
}

fn resolve_logs_dir(configured: &Path) -> anyhow::Result<PathBuf> {
    if !configured.as_os_str().is_empty() {
        return Ok(configured.to_path_buf());
    }
    let data_dir = dirs::data_dir().context("No platform data directory for log files")?;
    Ok(data_dir.join("authflow").join("logs"))
}

fn build_file_writer(configured: &Path) -> anyhow::Result<NonBlocking> {
    let logs_dir = resolve_logs_dir(configured)?;
    fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create log directory: {}", logs_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&logs_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    LOG_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Tracing log guard already initialized"))?;

    Ok(non_blocking)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_directives() {
        let dev_directives = build_filter_directives(true);
        assert!(dev_directives.contains(&"debug".to_string()));
        assert!(dev_directives.contains(&"af_app=debug".to_string()));
        assert!(dev_directives.contains(&"tokio=warn".to_string()));

        let prod_directives = build_filter_directives(false);
        assert!(prod_directives.contains(&"info".to_string()));
        assert!(prod_directives.contains(&"af_infra=info".to_string()));
    }

    #[test]
    fn test_configured_logs_dir_wins() {
        let dir = resolve_logs_dir(Path::new("/var/log/authflow")).unwrap();

        assert_eq!(dir, PathBuf::from("/var/log/authflow"));
    }

    #[test]
    fn test_empty_logs_dir_falls_back_to_data_dir() {
        // Some CI sandboxes have no data dir; the fallback is only checked when one exists.
        if let Some(data_dir) = dirs::data_dir() {
            let dir = resolve_logs_dir(Path::new("")).unwrap();
            assert_eq!(dir, data_dir.join("authflow").join("logs"));
        }
    }
}
