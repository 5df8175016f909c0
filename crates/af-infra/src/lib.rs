//! Adapters for the collaborator ports of `af-core`.
//!
//! The hosted page, the scraper and the history stack live outside this
//! process in a real embedding. These adapters keep their observable state in
//! memory so the runtime can be driven from a script or a test.

pub mod events;
pub mod history;
pub mod page;
pub mod passwordless;
pub mod scraper;

pub use events::ChannelEventSink;
pub use history::InMemoryHistory;
pub use page::RecordingHostedPage;
pub use passwordless::StaticPasswordlessDirectory;
pub use scraper::ScriptedScraper;
