//! kiln-lib: Core types and logic for kiln
//!
//! This crate provides the pieces of a hermetic build system's configuration layer:
//! - `key`: planner keys, including the toolchain resolution request
//! - `doc`: reference documentation for built-in modules
//! - `dsl`: operation descriptors, argument binding and the native module registry
//! - `cc`: the `cc_common` module exposed to configurations
//! - `eval`: evaluation of Lua configuration files into a `Manifest`

pub mod cc;
pub mod consts;
pub mod doc;
pub mod dsl;
pub mod eval;
pub mod key;
pub mod lua;
pub mod manifest;
pub mod util;
