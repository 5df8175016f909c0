use serde::{Deserialize, Serialize};

/// Authorization mode the host loads the flow in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    Default,
    Offline,
    /// Desktop sign-in; the page may hand over the password directly.
    Desktop,
}

/// Kind of authentication the hosted page is running.
///
/// Only ever moves `Default` → `Saml` within a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFlow {
    #[default]
    Default,
    Saml,
}
