//! Configuration file evaluation.
//!
//! This module provides [`evaluate_config`], which takes a path to a Lua
//! configuration file and returns the resulting [`Manifest`] containing every
//! link request the configuration declared through `cc_common`.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use mlua::prelude::*;
use tracing::{debug, info};

use crate::cc;
use crate::dsl::{DslError, EvalThread, Interrupt, ModuleRegistry, RegistryError};
use crate::key::{KeyError, Label};
use crate::lua::runtime::{self, RuntimeOptions};
use crate::manifest::Manifest;

/// Errors that can occur during config evaluation.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
  /// A native operation rejected a call.
  #[error(transparent)]
  Dsl(DslError),

  /// Lua evaluation error.
  #[error("lua error: {0}")]
  Lua(LuaError),

  #[error("invalid target label: {0}")]
  Label(#[from] KeyError),

  #[error("module registration failed: {0}")]
  Registry(#[from] RegistryError),
}

impl From<LuaError> for EvalError {
  /// Native operation errors raised inside Lua are surfaced unchanged.
  fn from(err: LuaError) -> Self {
    match DslError::from_lua(&err) {
      Some(dsl) => EvalError::Dsl(dsl.clone()),
      None => EvalError::Lua(err),
    }
  }
}

/// The registry of built-in native modules.
pub fn builtin_registry() -> Result<Arc<ModuleRegistry>, RegistryError> {
  let mut registry = ModuleRegistry::new();
  cc::register(&mut registry)?;
  Ok(Arc::new(registry))
}

/// Evaluate a Lua configuration file with the built-in modules.
///
/// # Example
/// ```ignore
/// use std::path::Path;
/// use kiln_lib::eval::evaluate_config;
/// use kiln_lib::lua::runtime::RuntimeOptions;
///
/// let manifest = evaluate_config(Path::new("BUILD.lua"), &RuntimeOptions::default())?;
/// println!("Links: {}", manifest.links.len());
/// ```
pub fn evaluate_config(path: &Path, options: &RuntimeOptions) -> Result<Manifest, EvalError> {
  evaluate_config_with(path, builtin_registry()?, options, Interrupt::new())
}

/// Evaluate a Lua configuration file against `registry`.
///
/// Cancelling `interrupt` makes the next native call fail with
/// [`DslError::Interrupted`].
pub fn evaluate_config_with(
  path: &Path,
  registry: Arc<ModuleRegistry>,
  options: &RuntimeOptions,
  interrupt: Interrupt,
) -> Result<Manifest, EvalError> {
  Label::new(&options.label)?;
  let manifest = Rc::new(RefCell::new(Manifest::default()));

  // Evaluate in a block so the Lua state and its closures release the
  // manifest before it is unwrapped.
  {
    let thread = EvalThread::new(&options.label, interrupt, manifest.clone());
    let lua = runtime::create_runtime(registry, options, thread)?;
    debug!(path = %path.display(), label = %options.label, "evaluating config");
    runtime::load_file(&lua, path)?;
  }

  let manifest = Rc::try_unwrap(manifest)
    .map(RefCell::into_inner)
    .unwrap_or_else(|shared| shared.borrow().clone());
  info!(path = %path.display(), links = manifest.links.len(), "evaluated config");
  Ok(manifest)
}
