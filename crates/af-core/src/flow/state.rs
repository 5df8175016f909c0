use serde_json::Value;

use super::mode::AuthFlow;
use crate::security::SecretString;

/// The `(email, gaiaId)` tuple correlating passwordless lookups with the
/// state that requested them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityPair {
    pub email: String,
    pub gaia_id: String,
}

impl IdentityPair {
    pub fn new(email: impl Into<String>, gaia_id: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            gaia_id: gaia_id.into(),
        }
    }
}

/// Everything learned so far about the current sign-in attempt.
///
/// One instance per load cycle. `Default` is the post-reset baseline.
#[derive(Debug)]
pub struct FlowState {
    pub email: Option<String>,
    pub gaia_id: Option<String>,
    pub session_index: Option<String>,
    pub password: Option<SecretString>,
    auth_flow: AuthFlow,
    pub auth_domain: String,
    pub choose_what_to_sync: bool,
    pub skip_for_now: bool,
    trusted: bool,
    /// Raw `services` payload of the `userInfo` message; validated on finalize.
    pub services: Option<Value>,
    pub passwordless: Option<bool>,
    /// Identity pair of the passwordless lookup currently in flight.
    pub passwordless_in_flight: Option<IdentityPair>,
    /// Last email announced through an `attemptLogin` event.
    pub announced_email: Option<String>,
    pub video_enabled: bool,
    pub ready_fired: bool,
    pub loaded: bool,
}

impl Default for FlowState {
    fn default() -> Self {
        Self {
            email: None,
            gaia_id: None,
            session_index: None,
            password: None,
            auth_flow: AuthFlow::Default,
            auth_domain: String::new(),
            choose_what_to_sync: false,
            skip_for_now: false,
            trusted: true,
            services: None,
            passwordless: None,
            passwordless_in_flight: None,
            announced_email: None,
            video_enabled: false,
            ready_fired: false,
            loaded: false,
        }
    }
}

impl FlowState {
    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    /// Mark the cycle untrusted. There is no way back within a cycle.
    pub fn mark_untrusted(&mut self) {
        self.trusted = false;
    }

    /// Switch to the SAML flow. There is no way back within a cycle.
    pub fn mark_saml(&mut self) {
        self.auth_flow = AuthFlow::Saml;
    }

    pub fn auth_flow(&self) -> AuthFlow {
        self.auth_flow
    }

    pub fn is_saml(&self) -> bool {
        self.auth_flow == AuthFlow::Saml
    }

    /// Email, gaiaId and sessionIndex are all known.
    pub fn has_complete_identity(&self) -> bool {
        non_empty(&self.email) && non_empty(&self.gaia_id) && non_empty(&self.session_index)
    }

    pub fn identity_pair(&self) -> Option<IdentityPair> {
        match (&self.email, &self.gaia_id) {
            (Some(email), Some(gaia_id)) if !email.is_empty() && !gaia_id.is_empty() => {
                Some(IdentityPair::new(email.clone(), gaia_id.clone()))
            }
            _ => None,
        }
    }

    pub fn has_gaia_id(&self) -> bool {
        non_empty(&self.gaia_id)
    }

    /// Set the email and drop any passwordless answer tied to the old pair.
    pub fn set_email(&mut self, email: Option<String>) {
        self.email = email;
        self.passwordless = None;
    }

    /// Replace the identity and drop any passwordless answer tied to the old pair.
    pub fn set_identity(
        &mut self,
        email: Option<String>,
        gaia_id: Option<String>,
        session_index: Option<String>,
    ) {
        self.email = email;
        self.gaia_id = gaia_id;
        self.session_index = session_index;
        self.passwordless = None;
    }

    /// True when the state is indistinguishable from a freshly reset one.
    pub fn is_baseline(&self) -> bool {
        self.email.is_none()
            && self.gaia_id.is_none()
            && self.session_index.is_none()
            && self.password.is_none()
            && self.auth_flow == AuthFlow::Default
            && self.auth_domain.is_empty()
            && !self.choose_what_to_sync
            && !self.skip_for_now
            && self.trusted
            && self.services.is_none()
            && self.passwordless.is_none()
            && self.passwordless_in_flight.is_none()
            && self.announced_email.is_none()
            && !self.video_enabled
            && !self.ready_fired
            && !self.loaded
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}
