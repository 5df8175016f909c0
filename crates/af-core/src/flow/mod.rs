//! Sign-in flow domain module.
//!
//! Defines the per-cycle flow state, the inputs that mutate it and the pure
//! completion routine deciding when a cycle may finish.

pub mod completion;
pub mod decision;
pub mod event;
pub mod headers;
pub mod input;
pub mod message;
pub mod mode;
pub mod params;
pub mod policy;
pub mod state;
pub mod task;

pub use completion::{CompletionResult, CompletionSummary};
pub use decision::{
    CompletionContext, CompletionDecision, CompletionRoutine, DeferReason, PasswordSource,
    RegisteredHandlers, ScraperSnapshot,
};
pub use event::FlowEvent;
pub use headers::{HttpHeader, RequestDetails, SigninDetails};
pub use input::{FlowInput, ScraperEvent};
pub use message::{MessageError, PageEnvelope, PageMessage};
pub use mode::{AuthFlow, AuthMode};
pub use params::{FlowParams, ResolvedParams};
pub use policy::{DomainSuffixAllowList, ServicesPolicy};
pub use state::{FlowState, IdentityPair};
pub use task::ScheduledTask;

/// Default identity-provider origin.
pub const IDP_ORIGIN: &str = "https://accounts.google.com/";

/// Default continue URL the IdP redirects to after sign-in.
pub const CONTINUE_URL: &str = "chrome-extension://mfffpogegjflfpflabcdkioaeobkgjik/success.html";

/// Response header carrying the signed-in identity.
pub const SIGN_IN_HEADER: &str = "google-accounts-signin";

/// Response header marking an embedded sign-in form.
pub const EMBEDDED_FORM_HEADER: &str = "google-accounts-embedded";

pub const LOCATION_HEADER: &str = "location";

pub const BLANK_PAGE_URL: &str = "about:blank";
