//! # af-core
//!
//! Core domain models and completion logic for the authflow sign-in host.
//!
//! This crate contains pure logic without any infrastructure dependencies:
//! the per-cycle flow state, header and page-message decoding, the completion
//! decision routine and the port traits the application layer drives.

pub mod config;
pub mod flow;
pub mod ports;
pub mod security;

// Re-export commonly used types at the crate root
pub use config::FlowConfig;
pub use flow::{
    AuthFlow, AuthMode, CompletionDecision, CompletionResult, CompletionRoutine, DeferReason,
    FlowEvent, FlowInput, FlowParams, FlowState, IdentityPair, PageMessage, PasswordSource,
    ScheduledTask, ScraperEvent,
};
pub use security::SecretString;
