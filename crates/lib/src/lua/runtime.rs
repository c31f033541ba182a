use std::path::{Path, PathBuf};
use std::sync::Arc;

use mlua::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cc::CcToolchain;
use crate::consts::INTERRUPT_CHECK_INSTRUCTIONS;
use crate::dsl::{EvalThread, ModuleRegistry};
use crate::lua::{globals, modules};

/// Settings for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeOptions {
  /// Label of the target being evaluated.
  pub label: String,
  pub toolchain: CcToolchain,
  /// Enabled toolchain features.
  pub features: Vec<String>,
  /// Directories searched for `require`d modules before the defaults.
  pub package_paths: Vec<PathBuf>,
}

impl Default for RuntimeOptions {
  fn default() -> Self {
    Self {
      label: "//:main".to_string(),
      toolchain: CcToolchain::default(),
      features: Vec::new(),
      package_paths: Vec::new(),
    }
  }
}

/// Create a new Lua runtime environment with standard settings.
/// Registers the prelude and every module in `registry`, and makes running
/// Lua code fail with `DslError::Interrupted` once the thread's interrupt is
/// cancelled.
/// Returns the initialized Lua instance.
pub fn create_runtime(registry: Arc<ModuleRegistry>, options: &RuntimeOptions, thread: EvalThread) -> LuaResult<Lua> {
  let lua = Lua::new();
  let package = lua.globals().get::<LuaTable>("package")?;
  let package_path = package.get::<String>("path")?;
  let extra: String = options
    .package_paths
    .iter()
    .map(|dir| format!("{0}/?.lua;{0}/?/init.lua;", dir.display()))
    .collect();
  package.set("path", format!("{}./lua/?.lua;./lua/?/init.lua;{}", extra, package_path))?;

  let interrupt = thread.interrupt().clone();
  lua.set_global_hook(
    LuaHookTriggers::new().every_nth_instruction(INTERRUPT_CHECK_INSTRUCTIONS),
    move |_, _| {
      interrupt.check().map_err(LuaError::external)?;
      Ok(LuaVmState::Continue)
    },
  )?;

  globals::register_globals(&lua, options)?;
  modules::install_modules(&lua, registry, thread)?;

  Ok(lua)
}

/// Load and execute a Lua file at the given path.
/// Sets `ctx.dir` to the directory of the loaded file.
/// Returns the result of the file execution.
pub fn load_file(lua: &Lua, path: &Path) -> LuaResult<LuaValue> {
  let canonical_path = path
    .canonicalize()
    .map_err(|e| LuaError::external(format!("cannot canonicalize '{}': {}", path.display(), e)))?;
  let content = std::fs::read_to_string(&canonical_path)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", canonical_path.display(), e)))?;

  let ctx = lua.globals().get::<LuaTable>(crate::consts::CTX_GLOBAL)?;
  ctx.set(
    "dir",
    canonical_path
      .parent()
      .unwrap_or(Path::new(""))
      .to_string_lossy()
      .to_string(),
  )?;

  let result = lua
    .load(&content)
    .set_name(format!("@{}", canonical_path.display()))
    .eval::<LuaValue>()?;
  Ok(result)
}
