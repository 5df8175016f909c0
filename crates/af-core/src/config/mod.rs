//! # Pure Data Module - Data Transfer Objects Only
//!
//! ## Responsibilities
//!
//! - ✅ Define the `[flow]` configuration data structure
//! - ✅ Provide TOML → DTO mapping
//!
//! ## Prohibited
//!
//! ❌ **No validation logic**
//! ❌ **No default value calculation** (the flow parameters resolve defaults)
//!
//! > **This module contains data only, no policy, no validation.**

/// Flow configuration DTO (pure data, no logic).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    /// Identity-provider origin, with trailing slash (may be empty).
    pub idp_origin: String,

    /// URL the IdP redirects to once sign-in is done (may be empty).
    pub continue_url: String,

    /// Email suffixes for which the flow waits for a `userInfo` message.
    /// Empty means "use the built-in list"; the DTO does not decide that.
    pub services_allowlist: Vec<String>,
}

impl FlowConfig {
    /// Create FlowConfig from a TOML value.
    ///
    /// Missing keys and wrongly typed values read as empty. Empty strings are
    /// valid facts here.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let flow = toml_value.get("flow");
        Ok(Self {
            idp_origin: flow
                .and_then(|f| f.get("idp_origin"))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            continue_url: flow
                .and_then(|f| f.get("continue_url"))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            services_allowlist: flow
                .and_then(|f| f.get("services_allowlist"))
                .and_then(|v| v.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.as_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Create an empty FlowConfig (all empty values).
    pub fn empty() -> Self {
        Self {
            idp_origin: String::new(),
            continue_url: String::new(),
            services_allowlist: Vec::new(),
        }
    }
}
