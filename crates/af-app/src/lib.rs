//! authflow application layer
//!
//! This crate contains the flow controller, which owns the per-cycle flow
//! state and performs every side effect the completion routine asks for,
//! and the runtime that serializes collaborator inputs into it.

pub mod usecases;

pub use usecases::flow::{
    FlowCapabilities, FlowController, FlowError, FlowHandle, FlowPorts, FlowRuntime,
};
