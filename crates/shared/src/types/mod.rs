//! Shared domain types.

pub mod id;
pub mod run;

pub use id::RunId;
pub use run::{RunState, RunType};
