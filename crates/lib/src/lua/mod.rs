//! Lua runtime and evaluation.
//!
//! This module provides the Lua execution environment for kiln configurations.
//! It manages the Lua VM lifecycle, registers the prelude, and exposes native
//! modules from a [`ModuleRegistry`](crate::dsl::ModuleRegistry).
//!
//! # Submodules
//!
//! - [`convert`] - Conversion between Lua values and DSL values
//! - [`globals`] - Prelude globals (`None`, `depset`, `file`, `ctx`)
//! - [`modules`] - Native module tables and call dispatch
//! - [`runtime`] - Low-level Lua VM management

pub mod convert;
pub mod globals;
pub mod modules;
pub mod runtime;
