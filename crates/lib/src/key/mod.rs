//! Planner keys.
//!
//! Keys are immutable value objects used as memoization identities by the
//! planner. Equality and hashing are structural over every field, and sets are
//! stored sorted, so two keys populated with the same values in any order are
//! interchangeable (including their fingerprints).
//!
//! # Toolchain resolution
//!
//! [`ToolchainRequestKey`] identifies the inputs needed to pick an execution
//! platform and resolve a set of toolchain types within one build
//! configuration. It is memoized under [`FunctionName::TOOLCHAIN_RESOLUTION`]
//! and is marked CPU heavy, because resolving it may load packages.
//!
//! ```
//! use kiln_lib::key::{ConfigurationId, Label, ToolchainRequestKey, ToolchainTypeRequirement};
//!
//! let key = ToolchainRequestKey::builder()
//!   .configuration(ConfigurationId::new("k8-fastbuild"))
//!   .toolchain_types([ToolchainTypeRequirement::mandatory(Label::new("//toolchains:cpp").unwrap())])
//!   .build()
//!   .unwrap();
//! assert!(key.force_execution_platform().is_none());
//! ```

mod types;

pub use types::*;
