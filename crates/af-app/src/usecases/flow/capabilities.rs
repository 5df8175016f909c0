//! Optional host handlers, registered once at construction.

use std::fmt;
use std::sync::Arc;

use af_core::flow::RegisteredHandlers;
use af_core::ports::PasswordlessQueryPort;

/// Identity is incomplete and the page is about to restart.
pub type MissingInfoHandler = Arc<dyn Fn() + Send + Sync>;
/// Several passwords were scraped: `(email, scraped_count)`.
pub type ConfirmPasswordHandler = Arc<dyn Fn(&str, usize) + Send + Sync>;
/// No password was scraped: `(email)`.
pub type NoPasswordHandler = Arc<dyn Fn(&str) + Send + Sync>;
pub type SamlApiUsedHandler = Arc<dyn Fn() + Send + Sync>;
/// Insecure content was blocked: `(url)`.
pub type ContentBlockedHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// The set of optional capabilities the host supports.
///
/// An absent handler changes what the completion routine decides, so the
/// set is fixed for the lifetime of a controller.
#[derive(Clone, Default)]
pub struct FlowCapabilities {
    pub missing_info: Option<MissingInfoHandler>,
    pub confirm_password: Option<ConfirmPasswordHandler>,
    pub no_password: Option<NoPasswordHandler>,
    pub saml_api_used: Option<SamlApiUsedHandler>,
    pub content_blocked: Option<ContentBlockedHandler>,
    pub passwordless_query: Option<Arc<dyn PasswordlessQueryPort>>,
}

impl FlowCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_info(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.missing_info = Some(Arc::new(handler));
        self
    }

    pub fn with_confirm_password(
        mut self,
        handler: impl Fn(&str, usize) + Send + Sync + 'static,
    ) -> Self {
        self.confirm_password = Some(Arc::new(handler));
        self
    }

    pub fn with_no_password(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.no_password = Some(Arc::new(handler));
        self
    }

    pub fn with_saml_api_used(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.saml_api_used = Some(Arc::new(handler));
        self
    }

    pub fn with_content_blocked(
        mut self,
        handler: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.content_blocked = Some(Arc::new(handler));
        self
    }

    pub fn with_passwordless_query(mut self, query: Arc<dyn PasswordlessQueryPort>) -> Self {
        self.passwordless_query = Some(query);
        self
    }

    pub fn registered(&self) -> RegisteredHandlers {
        RegisteredHandlers {
            missing_info: self.missing_info.is_some(),
            confirm_password: self.confirm_password.is_some(),
            no_password: self.no_password.is_some(),
            saml_api_used: self.saml_api_used.is_some(),
            content_blocked: self.content_blocked.is_some(),
            passwordless_query: self.passwordless_query.is_some(),
        }
    }
}

impl fmt::Debug for FlowCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowCapabilities")
            .field("registered", &self.registered())
            .finish()
    }
}
