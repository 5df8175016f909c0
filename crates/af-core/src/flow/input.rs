use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::headers::RequestDetails;
use super::message::PageEnvelope;
use super::mode::AuthMode;
use super::state::IdentityPair;
use super::task::ScheduledTask;
use crate::security::SecretString;

/// Events raised by the credential-scraping collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScraperEvent {
    /// A page finished loading; `is_saml_page` tells whether it is a SAML IdP page.
    AuthPageLoaded { is_saml_page: bool },
    /// A password arrived through the in-page credentials API.
    ApiPasswordAdded,
    /// Insecure content was blocked on the hosted page.
    InsecureContentBlocked { url: String },
    /// The page requested camera access.
    VideoEnabled,
}

/// Every input the flow controller consumes, in one closed set.
///
/// The runtime funnels all collaborator callbacks through this type so that
/// exactly one handler runs at a time.
#[derive(Debug)]
pub enum FlowInput {
    Load { mode: AuthMode, params: Value },
    Reload,
    ResetPage,
    NavigationCompleted(RequestDetails),
    HeadersReceived(RequestDetails),
    Message(PageEnvelope),
    ContentLoaded,
    LoadAborted { error: String, url: String },
    LoadCommitted,
    PopState { url: Option<String> },
    DropLink { url: String },
    NewWindow { url: String },
    Scraper(ScraperEvent),
    VerifyConfirmedPassword(SecretString),
    CompleteWithManualPassword(SecretString),
    PasswordlessResolved {
        pair: IdentityPair,
        is_passwordless: bool,
    },
    /// A task deferred to a later turn is now due.
    Scheduled(ScheduledTask),
    Shutdown,
}

impl FlowInput {
    /// Short name of the input, for spans and logs.
    pub fn name(&self) -> &'static str {
        match self {
            FlowInput::Load { .. } => "load",
            FlowInput::Reload => "reload",
            FlowInput::ResetPage => "reset_page",
            FlowInput::NavigationCompleted(_) => "navigation_completed",
            FlowInput::HeadersReceived(_) => "headers_received",
            FlowInput::Message(_) => "message",
            FlowInput::ContentLoaded => "content_loaded",
            FlowInput::LoadAborted { .. } => "load_aborted",
            FlowInput::LoadCommitted => "load_committed",
            FlowInput::PopState { .. } => "pop_state",
            FlowInput::DropLink { .. } => "drop_link",
            FlowInput::NewWindow { .. } => "new_window",
            FlowInput::Scraper(_) => "scraper",
            FlowInput::VerifyConfirmedPassword(_) => "verify_confirmed_password",
            FlowInput::CompleteWithManualPassword(_) => "complete_with_manual_password",
            FlowInput::PasswordlessResolved { .. } => "passwordless_resolved",
            FlowInput::Scheduled(_) => "scheduled",
            FlowInput::Shutdown => "shutdown",
        }
    }
}
