//! # authflow
//!
//! Binary-side wiring of the sign-in flow engine: configuration, tracing and
//! the JSON-lines replay driver.

pub mod bootstrap;
pub mod replay;

pub use bootstrap::{load_config, AppConfig};
pub use replay::{parse_script, run_replay, ReplayStep};
