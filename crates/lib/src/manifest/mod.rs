//! Evaluation manifests.
//!
//! Manifests are the evaluated result of a Lua configuration: every link
//! request the configuration declared, ready to hand to a planner.

mod types;

pub use types::*;
