//! Shared helpers for library integration tests.

use std::cell::RefCell;
use std::rc::Rc;

use kiln_lib::dsl::{EvalThread, Interrupt};
use kiln_lib::eval::builtin_registry;
use kiln_lib::lua::runtime::{RuntimeOptions, create_runtime};
use kiln_lib::manifest::Manifest;
use mlua::prelude::*;

/// A runtime with the built-in modules and default options, plus the manifest
/// it records into.
pub fn create_test_runtime() -> LuaResult<(Lua, Rc<RefCell<Manifest>>)> {
  create_test_runtime_with(&RuntimeOptions::default())
}

pub fn create_test_runtime_with(options: &RuntimeOptions) -> LuaResult<(Lua, Rc<RefCell<Manifest>>)> {
  let manifest = Rc::new(RefCell::new(Manifest::default()));
  let registry = builtin_registry().map_err(LuaError::external)?;
  let thread = EvalThread::new("test", Interrupt::new(), manifest.clone());
  let lua = create_runtime(registry, options, thread)?;
  Ok((lua, manifest))
}

/// The `link` arguments every call needs, taken from `ctx`.
pub const LINK_CONTEXT: &str = r#"
  actions = ctx.actions,
  feature_configuration = ctx.feature_configuration,
  cc_toolchain = ctx.cc_toolchain,
"#;
