//! Flow parameters handed to `load`.
//!
//! Parameters come from the host page as an untyped JSON object. Fields are
//! read one by one; a missing or wrongly typed field reads as absent, so a
//! malformed object degrades to defaults instead of failing the load.

use serde_json::Value;

use super::mode::AuthMode;
use super::{CONTINUE_URL, IDP_ORIGIN};
use crate::config::FlowConfig;

/// Raw flow parameters (pure data, every field optional).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowParams {
    pub gaia_url: Option<String>,
    pub gaia_path: Option<String>,
    pub continue_url: Option<String>,
    pub frame_url: Option<String>,
    pub initial_frame_url: Option<String>,
    pub constrained: bool,
    pub is_new_gaia_flow: bool,
    pub dont_resize_non_embedded_pages: bool,
    pub need_password: Option<bool>,
}

impl FlowParams {
    pub fn from_value(value: &Value) -> Self {
        let string = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let flag = |key: &str| value.get(key).and_then(Value::as_bool).unwrap_or(false);

        Self {
            gaia_url: string("gaiaUrl"),
            gaia_path: string("gaiaPath"),
            continue_url: string("continueUrl"),
            frame_url: string("frameUrl"),
            initial_frame_url: string("initialFrameUrl"),
            // Hosts pass either the string "1" or a boolean.
            constrained: match value.get("constrained") {
                Some(Value::String(s)) => s == "1",
                Some(Value::Bool(b)) => *b,
                _ => false,
            },
            is_new_gaia_flow: flag("isNewGaiaFlow"),
            dont_resize_non_embedded_pages: flag("dontResizeNonEmbeddedPages"),
            need_password: value.get("needPassword").and_then(Value::as_bool),
        }
    }

    /// Resolve the parameters against config and built-in defaults.
    pub fn resolve(&self, mode: AuthMode, config: &FlowConfig) -> ResolvedParams {
        let idp_origin = first_non_empty(&[self.gaia_url.as_deref(), Some(config.idp_origin.as_str())])
            .unwrap_or(IDP_ORIGIN)
            .to_string();
        let continue_url =
            first_non_empty(&[self.continue_url.as_deref(), Some(config.continue_url.as_str())])
                .unwrap_or(CONTINUE_URL)
                .to_string();
        let continue_url_without_params = match continue_url.find('?') {
            Some(idx) if idx > 0 => continue_url[..idx].to_string(),
            _ => continue_url.clone(),
        };
        let initial_frame_url = match (&self.initial_frame_url, &self.gaia_path) {
            (Some(url), _) => url.clone(),
            (None, Some(path)) => format!("{idp_origin}{path}"),
            (None, None) => idp_origin.clone(),
        };
        let reload_url = self
            .frame_url
            .clone()
            .unwrap_or_else(|| initial_frame_url.clone());
        let block_insecure_content =
            mode != AuthMode::Desktop && idp_origin.starts_with("https://");

        ResolvedParams {
            mode,
            idp_origin,
            continue_url,
            continue_url_without_params,
            initial_frame_url,
            reload_url,
            constrained: self.constrained,
            is_new_gaia_flow: self.is_new_gaia_flow,
            dont_resize_non_embedded_pages: self.dont_resize_non_embedded_pages,
            need_password: self.need_password.unwrap_or(true),
            block_insecure_content,
        }
    }
}

fn first_non_empty<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|value| !value.is_empty())
}

/// Parameters of the current load, with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParams {
    pub mode: AuthMode,
    pub idp_origin: String,
    pub continue_url: String,
    pub continue_url_without_params: String,
    pub initial_frame_url: String,
    pub reload_url: String,
    pub constrained: bool,
    pub is_new_gaia_flow: bool,
    pub dont_resize_non_embedded_pages: bool,
    pub need_password: bool,
    pub block_insecure_content: bool,
}

impl ResolvedParams {
    /// Origin as page messages report it (no trailing slash).
    pub fn message_origin(&self) -> &str {
        self.idp_origin
            .strip_suffix('/')
            .unwrap_or(&self.idp_origin)
    }

    pub fn is_idp_url(&self, url: &str) -> bool {
        url.starts_with(&self.idp_origin)
    }
}
