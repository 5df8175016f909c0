//! Port interfaces for the application layer
//!
//! Ports define the contract between the flow controller and the
//! collaborators it drives: the hosted page, the credential scraper, the
//! history stack, the outbound event sink and the passwordless directory.
//! Infrastructure adapters implement them; the controller only sees traits.
//!
//! Every port except [`PasswordlessQueryPort`] is synchronous: handlers run
//! to completion one at a time and never wait on a collaborator.

mod credential_scraper;
mod flow_event;
mod history;
mod hosted_page;
mod passwordless;

pub use credential_scraper::CredentialScraperPort;
pub use flow_event::FlowEventPort;
pub use history::HistoryPort;
pub use hosted_page::HostedPagePort;
pub use passwordless::PasswordlessQueryPort;
