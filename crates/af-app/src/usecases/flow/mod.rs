//! Sign-in flow use case.
//!
//! [`FlowController`] handles one input at a time; [`FlowRuntime`] feeds it
//! from a channel and runs the tasks it defers to a later turn.

mod capabilities;
mod controller;
mod runtime;
mod scheduler;

pub use capabilities::{
    ConfirmPasswordHandler, ContentBlockedHandler, FlowCapabilities, MissingInfoHandler,
    NoPasswordHandler, SamlApiUsedHandler,
};
pub use controller::{FlowController, FlowError, FlowPorts};
pub use runtime::{FlowHandle, FlowRuntime};
