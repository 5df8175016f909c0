//! # Configuration Loader
//!
//! ## Responsibilities
//!
//! - ✅ Read the TOML configuration file
//! - ✅ Map the `[flow]`, `[passwordless]` and `[logging]` sections to DTOs
//! - ✅ Report I/O and parsing errors with context
//!
//! ## Prohibited
//!
//! ❌ **No validation logic**
//! ❌ **No default value logic** (consumers decide what an empty value means)
//!
//! > **Pure data loading only. Accept whatever is in the file.**

use anyhow::Context;
use std::path::PathBuf;

use af_core::{FlowConfig, IdentityPair};

/// `[passwordless]` section: accounts the static directory reports as
/// passwordless, plus an artificial answer delay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordlessConfig {
    pub accounts: Vec<IdentityPair>,
    pub latency_ms: u64,
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log directory; empty means the platform data directory.
    pub dir: PathBuf,
    /// Whether to write a log file next to stdout.
    pub file: bool,
}

/// Whole-file configuration DTO (pure data, no logic).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub flow: FlowConfig,
    pub passwordless: PasswordlessConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Missing sections and wrongly typed values read as empty.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let passwordless = toml_value.get("passwordless");
        let logging = toml_value.get("logging");
        Ok(Self {
            flow: FlowConfig::from_toml(toml_value)?,
            passwordless: PasswordlessConfig {
                accounts: passwordless
                    .and_then(|p| p.get("accounts"))
                    .and_then(|v| v.as_array())
                    .map(|items| items.iter().filter_map(account_from_toml).collect())
                    .unwrap_or_default(),
                latency_ms: passwordless
                    .and_then(|p| p.get("latency_ms"))
                    .and_then(|v| v.as_integer())
                    .unwrap_or(0)
                    .max(0) as u64,
            },
            logging: LoggingConfig {
                dir: PathBuf::from(
                    logging
                        .and_then(|l| l.get("dir"))
                        .and_then(|v| v.as_str())
                        .unwrap_or(""),
                ),
                file: logging
                    .and_then(|l| l.get("file"))
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
            },
        })
    }

    pub fn empty() -> Self {
        Self {
            flow: FlowConfig::empty(),
            passwordless: PasswordlessConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn account_from_toml(item: &toml::Value) -> Option<IdentityPair> {
    let email = item.get("email")?.as_str()?;
    let gaia_id = item.get("gaia_id")?.as_str()?;
    Some(IdentityPair::new(email, gaia_id))
}

/// Load configuration from a TOML file.
///
/// **NO validation is performed**: empty strings and unknown suffixes are
/// accepted as facts.
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: PathBuf) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    AppConfig::from_toml(&toml_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_load_config_reads_every_section() {
        let temp_file = write_config(
            r#"
            [flow]
            idp_origin = "https://idp.test/"
            continue_url = "https://host.test/done"
            services_allowlist = ["@corp.test"]

            [passwordless]
            accounts = [{ email = "a@x.com", gaia_id = "123" }]
            latency_ms = 250

            [logging]
            dir = "/tmp/authflow-logs"
            file = true
        "#,
        );

        let config = load_config(temp_file.path().to_path_buf()).unwrap();

        assert_eq!(config.flow.idp_origin, "https://idp.test/");
        assert_eq!(config.flow.services_allowlist, vec!["@corp.test".to_string()]);
        assert_eq!(
            config.passwordless.accounts,
            vec![IdentityPair::new("a@x.com", "123")]
        );
        assert_eq!(config.passwordless.latency_ms, 250);
        assert_eq!(config.logging.dir, PathBuf::from("/tmp/authflow-logs"));
        assert!(config.logging.file);
    }

    #[test]
    fn test_load_config_returns_empty_values_when_missing() {
        let temp_file = write_config("[flow]\n");

        let config = load_config(temp_file.path().to_path_buf()).unwrap();

        assert_eq!(config, AppConfig::empty());
    }

    #[test]
    fn test_incomplete_accounts_are_skipped() {
        let temp_file = write_config(
            r#"
            [passwordless]
            accounts = [{ email = "a@x.com" }, { email = "b@x.com", gaia_id = "7" }, "c@x.com"]
            latency_ms = -5
        "#,
        );

        let config = load_config(temp_file.path().to_path_buf()).unwrap();

        assert_eq!(
            config.passwordless.accounts,
            vec![IdentityPair::new("b@x.com", "7")]
        );
        assert_eq!(config.passwordless.latency_ms, 0);
    }

    #[test]
    fn test_load_config_fails_on_invalid_toml() {
        let temp_file = write_config("[flow\nidp_origin = ");

        let err = load_config(temp_file.path().to_path_buf()).unwrap_err();

        assert!(err.to_string().contains("TOML"));
    }

    #[test]
    fn test_load_config_fails_on_missing_file() {
        let err = load_config(PathBuf::from("/nonexistent/authflow.toml")).unwrap_err();

        assert!(err.to_string().contains("Failed to read config file"));
    }
}
