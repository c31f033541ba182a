//! Global Lua values.
//!
//! This module registers the prelude every configuration sees:
//! - `None` - the explicit none value (Lua `nil` cannot be stored in a table)
//! - `depset{...}` - an immutable set with first-seen order
//! - `file(path)` - a file handle
//! - `ctx` - the evaluation context: `ctx.label`, `ctx.actions`,
//!   `ctx.feature_configuration`, `ctx.cc_toolchain`, `ctx.declare_file(name)`

use mlua::prelude::*;

use super::convert::{DepsetValue, FileValue, HandleValue, NONE_REGISTRY_KEY, NoneValue, from_lua};
use super::runtime::RuntimeOptions;
use crate::cc::{ActionFactory, FeatureConfiguration};
use crate::consts::{CTX_GLOBAL, NONE_GLOBAL};
use crate::dsl::{Artifact, Depset, DslValue, Handle};

/// Register the prelude globals in the Lua runtime.
pub fn register_globals(lua: &Lua, options: &RuntimeOptions) -> LuaResult<()> {
  let none = lua.create_userdata(NoneValue)?;
  lua.set_named_registry_value(NONE_REGISTRY_KEY, none.clone())?;
  lua.globals().set(NONE_GLOBAL, none)?;

  // depset{a, b, ...}
  let depset = lua.create_function(|lua, items: Option<LuaValue>| {
    let items = match items.map(from_lua).transpose()? {
      None | Some(DslValue::None) => Vec::new(),
      Some(DslValue::Sequence(items)) => items,
      Some(DslValue::Depset(depset)) => depset.to_list(),
      Some(other) => {
        return Err(LuaError::external(format!(
          "depset() expects a list, got {}",
          other.type_name()
        )));
      }
    };
    lua.create_userdata(DepsetValue(Depset::new(items)))
  })?;
  lua.globals().set("depset", depset)?;

  // file(path)
  let file = lua.create_function(|lua, path: String| {
    if path.is_empty() {
      return Err(LuaError::external("file() requires a non-empty path"));
    }
    lua.create_userdata(FileValue(Artifact::new(path)))
  })?;
  lua.globals().set("file", file)?;

  lua.globals().set(CTX_GLOBAL, create_ctx(lua, options)?)?;

  Ok(())
}

fn create_ctx(lua: &Lua, options: &RuntimeOptions) -> LuaResult<LuaTable> {
  let ctx = lua.create_table()?;
  let actions = ActionFactory::new(&options.label);

  ctx.set("label", options.label.as_str())?;
  ctx.set(
    "feature_configuration",
    HandleValue(Handle::new(FeatureConfiguration::new(options.features.iter().cloned()))),
  )?;
  ctx.set("cc_toolchain", HandleValue(Handle::new(options.toolchain.clone())))?;

  let declaring = actions.clone();
  let declare_file = lua.create_function(move |lua, name: String| {
    if name.is_empty() {
      return Err(LuaError::external("declare_file() requires a non-empty name"));
    }
    lua.create_userdata(FileValue(declaring.declare_file(&name)))
  })?;
  ctx.set("declare_file", declare_file)?;
  ctx.set("actions", HandleValue(Handle::new(actions)))?;

  Ok(ctx)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn create_test_lua() -> LuaResult<Lua> {
    let lua = Lua::new();
    register_globals(&lua, &RuntimeOptions::default())?;
    Ok(lua)
  }

  mod prelude {
    use super::*;

    #[test]
    fn globals_exist() -> LuaResult<()> {
      let lua = create_test_lua()?;
      for name in ["None", "depset", "file", "ctx"] {
        assert!(lua.globals().contains_key(name)?, "missing global {}", name);
      }
      Ok(())
    }

    #[test]
    fn none_is_a_singleton() -> LuaResult<()> {
      let lua = create_test_lua()?;
      let same: bool = lua.load("return None == None").eval()?;
      assert!(same);
      let shown: String = lua.load("return tostring(None)").eval()?;
      assert_eq!(shown, "None");
      Ok(())
    }

    #[test]
    fn depset_deduplicates() -> LuaResult<()> {
      let lua = create_test_lua()?;
      let count: i64 = lua
        .load("return #depset{ file('a.o'), file('b.o'), file('a.o') }")
        .eval()?;
      assert_eq!(count, 2);
      let empty: i64 = lua.load("return #depset()").eval()?;
      assert_eq!(empty, 0);
      Ok(())
    }

    #[test]
    fn depset_rejects_scalars() -> LuaResult<()> {
      let lua = create_test_lua()?;
      assert!(lua.load("return depset(3)").exec().is_err());
      Ok(())
    }

    #[test]
    fn file_requires_path() -> LuaResult<()> {
      let lua = create_test_lua()?;
      assert!(lua.load("return file('')").exec().is_err());
      Ok(())
    }
  }

  mod ctx {
    use super::*;
    use crate::cc::CcToolchain;

    #[test]
    fn exposes_target_and_toolchain() -> LuaResult<()> {
      let options = RuntimeOptions {
        label: "//app:server".to_string(),
        toolchain: CcToolchain {
          cpu: "aarch64".to_string(),
          ..Default::default()
        },
        features: vec!["thin_lto".to_string()],
        ..Default::default()
      };
      let lua = Lua::new();
      register_globals(&lua, &options)?;

      let label: String = lua.load("return ctx.label").eval()?;
      assert_eq!(label, "//app:server");
      let actions_label: String = lua.load("return ctx.actions.label").eval()?;
      assert_eq!(actions_label, "//app:server");
      let cpu: String = lua.load("return ctx.cc_toolchain.cpu").eval()?;
      assert_eq!(cpu, "aarch64");
      let feature: String = lua.load("return ctx.feature_configuration.features[1]").eval()?;
      assert_eq!(feature, "thin_lto");
      Ok(())
    }

    #[test]
    fn declare_file_is_package_relative() -> LuaResult<()> {
      let options = RuntimeOptions {
        label: "//app:server".to_string(),
        ..Default::default()
      };
      let lua = Lua::new();
      register_globals(&lua, &options)?;
      let path: String = lua.load("return ctx.declare_file('server.map').path").eval()?;
      assert_eq!(path, "app/server.map");
      Ok(())
    }

    #[test]
    fn unknown_handle_field_is_an_error() -> LuaResult<()> {
      let lua = create_test_lua()?;
      assert!(lua.load("return ctx.cc_toolchain.bogus").exec().is_err());
      Ok(())
    }
  }
}
