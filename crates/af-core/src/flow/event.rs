// FlowEvent only states facts the host can consume as-is; it never tells the
// host what to do next. Adding a variant changes the outbound protocol.

use serde_json::Value;

use super::completion::CompletionResult;

/// Observable lifecycle events produced by the flow controller.
#[derive(Debug)]
pub enum FlowEvent {
    /// The page became interactive, or was confirmed to be a SAML page.
    /// Fired at most once per cycle.
    Ready,
    /// The user submitted an identifier on the IdP page.
    AttemptLogin { email: String },
    /// Terminal event of a cycle.
    Completed(CompletionResult),
    LoadAbort { error: String, url: String },
    DialogShown,
    DialogHidden,
    BackButton { show: bool },
    ShowView,
    MenuItemClicked { item: Value },
    IdentifierEntered { account_identifier: String },
    ShowIncognito,
    /// A constrained window navigated to a non-embedded page.
    Resize { url: String },
    DropLink { url: String },
    NewWindow { url: String },
}

impl FlowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FlowEvent::Ready => "ready",
            FlowEvent::AttemptLogin { .. } => "attemptLogin",
            FlowEvent::Completed(_) => "completed",
            FlowEvent::LoadAbort { .. } => "loadAbort",
            FlowEvent::DialogShown => "dialogShown",
            FlowEvent::DialogHidden => "dialogHidden",
            FlowEvent::BackButton { .. } => "backButton",
            FlowEvent::ShowView => "showView",
            FlowEvent::MenuItemClicked { .. } => "menuItemClicked",
            FlowEvent::IdentifierEntered { .. } => "identifierEntered",
            FlowEvent::ShowIncognito => "showIncognito",
            FlowEvent::Resize { .. } => "resize",
            FlowEvent::DropLink { .. } => "dropLink",
            FlowEvent::NewWindow { .. } => "newWindow",
        }
    }
}
