//! Use cases.
//!
//! One use case per independently driven flow. Today that is the sign-in
//! flow only.

pub mod flow;
