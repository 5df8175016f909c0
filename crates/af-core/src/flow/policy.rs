//! Services gate policy.
//!
//! Accounts outside a small set of domains never receive a `userInfo`
//! message, so waiting for one would stall the flow forever. The policy
//! decides for which emails the flow keeps waiting.

/// Decides whether a cycle waits for a `userInfo` message before completing.
pub trait ServicesPolicy: Send + Sync {
    /// `true` to keep waiting, `false` to force an empty services list.
    fn waits_for_services(&self, email: Option<&str>) -> bool;
}

/// Waits only for emails ending with one of the configured suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSuffixAllowList {
    suffixes: Vec<String>,
}

impl DomainSuffixAllowList {
    pub const DEFAULT_SUFFIXES: [&'static str; 2] = ["@gmail.com", "@example.com"];

    /// Build from configured suffixes. An empty list falls back to the
    /// built-in suffixes.
    pub fn new(suffixes: Vec<String>) -> Self {
        if suffixes.is_empty() {
            return Self::default();
        }
        Self {
            suffixes: suffixes.into_iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }
}

impl Default for DomainSuffixAllowList {
    fn default() -> Self {
        Self {
            suffixes: Self::DEFAULT_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ServicesPolicy for DomainSuffixAllowList {
    fn waits_for_services(&self, email: Option<&str>) -> bool {
        let Some(email) = email else {
            return false;
        };
        let email = email.to_lowercase();
        self.suffixes.iter().any(|suffix| email.ends_with(suffix))
    }
}
