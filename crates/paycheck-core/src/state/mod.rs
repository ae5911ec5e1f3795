//! Engine state and command handling.

pub mod handlers;
pub mod machine;

pub use machine::{EngineState, PrintJobState, TimerToken};
