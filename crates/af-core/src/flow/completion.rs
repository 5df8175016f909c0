//! Assembly of the terminal `completed` payload.

use serde::Serialize;
use serde_json::Value;
use tracing::error;

use super::state::FlowState;
use crate::security::SecretString;

/// Normalized result of a finished cycle.
///
/// String fields default to empty and `services` to an empty list.
#[derive(Debug)]
pub struct CompletionResult {
    pub email: String,
    pub gaia_id: String,
    pub password: SecretString,
    pub using_saml: bool,
    pub choose_what_to_sync: bool,
    pub skip_for_now: bool,
    pub session_index: String,
    pub trusted: bool,
    pub services: Vec<String>,
}

impl CompletionResult {
    /// Build the result from the state, taking the password out of it.
    ///
    /// A passwordless SAML account never surfaces a credential, whatever was
    /// captured on the way.
    pub fn assemble(state: &mut FlowState) -> Self {
        let services = state
            .services
            .as_ref()
            .map(validate_services)
            .unwrap_or_default();
        let password = state.password.take();
        let passwordless = state.passwordless == Some(true)
            && state.is_saml()
            && state.email.as_deref().is_some_and(|e| !e.is_empty());
        let password = match password {
            Some(password) if !passwordless => password,
            _ => SecretString::empty(),
        };

        Self {
            email: state.email.clone().unwrap_or_default(),
            gaia_id: state.gaia_id.clone().unwrap_or_default(),
            password,
            using_saml: state.is_saml(),
            choose_what_to_sync: state.choose_what_to_sync,
            skip_for_now: state.skip_for_now,
            session_index: state.session_index.clone().unwrap_or_default(),
            trusted: state.is_trusted(),
            services,
        }
    }

    /// Loggable view of the result, with the password reduced to a flag.
    pub fn summary(&self) -> CompletionSummary {
        CompletionSummary {
            email: self.email.clone(),
            gaia_id: self.gaia_id.clone(),
            has_password: !self.password.is_empty(),
            using_saml: self.using_saml,
            choose_what_to_sync: self.choose_what_to_sync,
            skip_for_now: self.skip_for_now,
            session_index: self.session_index.clone(),
            trusted: self.trusted,
            services: self.services.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub email: String,
    pub gaia_id: String,
    pub has_password: bool,
    #[serde(rename = "usingSAML")]
    pub using_saml: bool,
    pub choose_what_to_sync: bool,
    pub skip_for_now: bool,
    pub session_index: String,
    pub trusted: bool,
    pub services: Vec<String>,
}

/// Keep the string entries of a `services` payload.
///
/// The host cannot reject a completion, so malformed entries are reported
/// and skipped rather than failing the cycle.
fn validate_services(services: &Value) -> Vec<String> {
    let Value::Array(items) = services else {
        error!(kind = json_kind(services), "FATAL: bad services type");
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::String(service) => Some(service.clone()),
            other => {
                error!(index, kind = json_kind(other), "FATAL: bad services entry type");
                None
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identified_state() -> FlowState {
        let mut state = FlowState::default();
        state.set_identity(Some("a@x.com".into()), Some("123".into()), Some("s1".into()));
        state
    }

    #[test]
    fn absent_fields_default_to_empty() {
        let mut state = FlowState::default();
        state.skip_for_now = true;

        let result = CompletionResult::assemble(&mut state);

        assert_eq!(result.email, "");
        assert_eq!(result.gaia_id, "");
        assert_eq!(result.session_index, "");
        assert!(result.password.is_empty());
        assert!(result.services.is_empty());
        assert!(result.trusted);
        assert!(result.skip_for_now);
    }

    #[test]
    fn malformed_services_entries_are_skipped() {
        let mut state = identified_state();
        state.services = Some(json!(["foo", 1, null, "bar"]));

        let result = CompletionResult::assemble(&mut state);

        assert_eq!(result.services, vec!["foo".to_string(), "bar".to_string()]);
    }

    #[test]
    fn non_list_services_become_empty() {
        let mut state = identified_state();
        state.services = Some(json!({"foo": true}));

        let result = CompletionResult::assemble(&mut state);

        assert!(result.services.is_empty());
    }

    #[test]
    fn passwordless_saml_account_drops_captured_password() {
        let mut state = identified_state();
        state.mark_saml();
        state.passwordless = Some(true);
        state.password = Some(SecretString::from("captured"));

        let result = CompletionResult::assemble(&mut state);

        assert!(result.using_saml);
        assert!(result.password.is_empty());
        assert!(state.password.is_none());
    }

    #[test]
    fn summary_hides_password() {
        let mut state = identified_state();
        state.password = Some(SecretString::from("pw"));
        state.mark_untrusted();

        let summary = CompletionResult::assemble(&mut state).summary();
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["hasPassword"], json!(true));
        assert_eq!(json["usingSAML"], json!(false));
        assert_eq!(json["trusted"], json!(false));
        assert!(json.get("password").is_none());
    }
}
