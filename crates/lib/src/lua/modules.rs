//! Native modules as Lua globals.
//!
//! Every module in the [`ModuleRegistry`] becomes a global table with one
//! function per operation name. Operations are called with a single table,
//! `cc_common.link{ name = "app", ... }`; its array part holds positional
//! arguments and its string keys hold named arguments. Modules with a
//! constructor are also callable themselves.

use std::collections::BTreeMap;
use std::sync::Arc;

use mlua::prelude::*;

use super::convert::{from_lua, to_lua};
use crate::dsl::{CallArgs, DslError, DslValue, EvalThread, ModuleRegistry};

/// Split a Lua call into positional and named arguments.
fn call_args(args: LuaMultiValue) -> LuaResult<CallArgs> {
  let mut args = args.into_iter();
  let first = args.next();
  if args.next().is_some() {
    return Err(LuaError::external(
      "native operations take a single table of arguments, e.g. op{ name = value }",
    ));
  }

  match first {
    None | Some(LuaValue::Nil) => Ok(CallArgs::new()),
    Some(LuaValue::Table(table)) => {
      let mut call = CallArgs::new();
      let len = table.raw_len();
      for i in 1..=len {
        call.positional.push(from_lua(table.raw_get(i)?)?);
      }
      let mut named = BTreeMap::new();
      for pair in table.pairs::<LuaValue, LuaValue>() {
        match pair? {
          (LuaValue::String(key), value) => {
            named.insert(key.to_str()?.to_string(), from_lua(value)?);
          }
          (LuaValue::Integer(i), _) if i >= 1 && (i as usize) <= len => {}
          (LuaValue::Integer(i), _) => {
            return Err(LuaError::external(format!(
              "positional arguments must be contiguous from 1, got index {}",
              i
            )));
          }
          (key, _) => {
            return Err(LuaError::external(format!(
              "argument names must be strings, got {}",
              key.type_name()
            )));
          }
        }
      }
      call.named = named.into_iter().collect();
      Ok(call)
    }
    Some(other) => Err(LuaError::external(format!(
      "native operations take a table of arguments, got {}",
      other.type_name()
    ))),
  }
}

fn finish(lua: &Lua, result: Result<DslValue, DslError>) -> LuaResult<LuaValue> {
  match result {
    Ok(value) => to_lua(lua, &value),
    Err(err) => Err(LuaError::external(err)),
  }
}

/// Install every registered module as a global table.
pub fn install_modules(lua: &Lua, registry: Arc<ModuleRegistry>, thread: EvalThread) -> LuaResult<()> {
  for module in registry.modules() {
    let table = lua.create_table()?;
    let module_name = module.name().to_string();

    for op_name in module.operation_names() {
      let registry = registry.clone();
      let thread = thread.clone();
      let module_name = module_name.clone();
      let op = op_name.to_string();
      let function = lua.create_function(move |lua, args: LuaMultiValue| {
        let call = call_args(args)?;
        let module = registry
          .get(&module_name)
          .ok_or_else(|| LuaError::external(format!("module '{}' is not registered", module_name)))?;
        finish(lua, module.invoke(&op, call, &thread))
      })?;
      table.set(op_name, function)?;
    }

    if module.has_constructor() {
      let registry = registry.clone();
      let thread = thread.clone();
      let module_name = module_name.clone();
      let construct = lua.create_function(move |lua, (_module, args): (LuaValue, LuaMultiValue)| {
        let call = call_args(args)?;
        let module = registry
          .get(&module_name)
          .ok_or_else(|| LuaError::external(format!("module '{}' is not registered", module_name)))?;
        finish(lua, module.invoke_constructor(call, &thread))
      })?;
      let metatable = lua.create_table()?;
      metatable.set("__call", construct)?;
      table.set_metatable(Some(metatable))?;
    }

    lua.globals().set(module_name, table)?;
  }
  Ok(())
}
