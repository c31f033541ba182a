//! Conversion between Lua values and [`DslValue`]s.
//!
//! Primitives map directly. Tables become sequences when they have array
//! keys and mappings when all keys are strings; an empty table is an empty
//! sequence. Files, depsets, native handles and the `None` sentinel cross as
//! userdata.

use std::collections::BTreeMap;

use mlua::prelude::*;

use crate::dsl::{Artifact, Depset, DslValue, Handle};

/// Registry key of the `None` singleton.
pub const NONE_REGISTRY_KEY: &str = "kiln.none";

/// The explicit `None` value. Lua `nil` cannot be stored in a table.
#[derive(Debug, Clone, Copy)]
pub struct NoneValue;

impl LuaUserData for NoneValue {
  fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
    methods.add_meta_method(LuaMetaMethod::ToString, |_, _this, ()| Ok("None"));
  }
}

/// A build file.
#[derive(Debug, Clone)]
pub struct FileValue(pub Artifact);

impl LuaUserData for FileValue {
  fn add_fields<F: LuaUserDataFields<Self>>(fields: &mut F) {
    fields.add_field_method_get("path", |_, this| Ok(this.0.path().to_string()));
    fields.add_field_method_get("basename", |_, this| Ok(this.0.basename().to_string()));
  }

  fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
    methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| Ok(this.0.to_string()));
    methods.add_meta_method(LuaMetaMethod::Eq, |_, this, other: LuaAnyUserData| {
      Ok(other.borrow::<FileValue>().map(|o| o.0 == this.0).unwrap_or(false))
    });
  }
}

/// An immutable set with first-seen iteration order.
#[derive(Debug, Clone)]
pub struct DepsetValue(pub Depset);

impl LuaUserData for DepsetValue {
  fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
    methods.add_method("to_list", |lua, this, ()| to_lua(lua, &DslValue::Sequence(this.0.to_list())));
    methods.add_meta_method(LuaMetaMethod::Len, |_, this, ()| Ok(this.0.len()));
    methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| {
      Ok(format!("depset({} items)", this.0.len()))
    });
  }
}

/// A native handle. Fields are read through the handle's own accessors.
#[derive(Debug, Clone)]
pub struct HandleValue(pub Handle);

impl LuaUserData for HandleValue {
  fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
    methods.add_meta_method(LuaMetaMethod::Index, |lua, this, key: String| match this.0.field(&key) {
      Some(value) => to_lua(lua, &value),
      None => Err(LuaError::external(format!(
        "'{}' value has no field '{}'",
        this.0.kind().type_name(),
        key
      ))),
    });
    methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| {
      Ok(format!("<{}>", this.0.kind().type_name()))
    });
  }
}

/// The `None` singleton.
pub fn none(lua: &Lua) -> LuaResult<LuaValue> {
  lua.named_registry_value(NONE_REGISTRY_KEY)
}

/// Convert a Lua value into a [`DslValue`].
pub fn from_lua(value: LuaValue) -> LuaResult<DslValue> {
  match value {
    LuaValue::Nil => Ok(DslValue::None),
    LuaValue::Boolean(b) => Ok(DslValue::Bool(b)),
    LuaValue::Integer(i) => Ok(DslValue::Int(i)),
    LuaValue::Number(n) if n.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&n) => {
      Ok(DslValue::Int(n as i64))
    }
    LuaValue::Number(n) if n.fract() == 0.0 => Err(LuaError::external(format!("integer value out of range: {}", n))),
    LuaValue::Number(n) => Err(LuaError::external(format!("float values are not supported: {}", n))),
    LuaValue::String(s) => Ok(DslValue::String(s.to_str()?.to_string())),
    LuaValue::Table(t) => table_from_lua(t),
    LuaValue::UserData(ud) => {
      if ud.is::<NoneValue>() {
        Ok(DslValue::None)
      } else if let Ok(file) = ud.borrow::<FileValue>() {
        Ok(DslValue::File(file.0.clone()))
      } else if let Ok(depset) = ud.borrow::<DepsetValue>() {
        Ok(DslValue::Depset(depset.0.clone()))
      } else if let Ok(handle) = ud.borrow::<HandleValue>() {
        Ok(DslValue::Handle(handle.0.clone()))
      } else {
        Err(LuaError::external("unsupported userdata value"))
      }
    }
    other => Err(LuaError::external(format!("unsupported value type: {}", other.type_name()))),
  }
}

fn table_from_lua(t: LuaTable) -> LuaResult<DslValue> {
  let len = t.raw_len();
  let mut items = Vec::with_capacity(len);
  for i in 1..=len {
    items.push(from_lua(t.raw_get(i)?)?);
  }

  let mut map = BTreeMap::new();
  for pair in t.pairs::<LuaValue, LuaValue>() {
    let (key, value) = pair?;
    match key {
      LuaValue::Integer(i) if i >= 1 && (i as usize) <= len => {}
      LuaValue::String(s) => {
        map.insert(s.to_str()?.to_string(), from_lua(value)?);
      }
      other => {
        return Err(LuaError::external(format!(
          "table keys must be strings or array indices, got {}",
          other.type_name()
        )));
      }
    }
  }

  match (items.is_empty(), map.is_empty()) {
    (_, true) => Ok(DslValue::Sequence(items)),
    (true, false) => Ok(DslValue::Mapping(map)),
    (false, false) => Err(LuaError::external("table mixes array and string keys")),
  }
}

/// Convert a [`DslValue`] into a Lua value.
pub fn to_lua(lua: &Lua, value: &DslValue) -> LuaResult<LuaValue> {
  match value {
    DslValue::None => none(lua),
    DslValue::Bool(b) => Ok(LuaValue::Boolean(*b)),
    DslValue::Int(i) => Ok(LuaValue::Integer(*i)),
    DslValue::String(s) => Ok(LuaValue::String(lua.create_string(s)?)),
    DslValue::Sequence(items) => {
      let table = lua.create_table_with_capacity(items.len(), 0)?;
      for item in items {
        table.raw_push(to_lua(lua, item)?)?;
      }
      Ok(LuaValue::Table(table))
    }
    DslValue::Mapping(map) => {
      let table = lua.create_table_with_capacity(0, map.len())?;
      for (key, item) in map {
        table.raw_set(key.as_str(), to_lua(lua, item)?)?;
      }
      Ok(LuaValue::Table(table))
    }
    DslValue::Depset(depset) => Ok(LuaValue::UserData(lua.create_userdata(DepsetValue(depset.clone()))?)),
    DslValue::File(file) => Ok(LuaValue::UserData(lua.create_userdata(FileValue(file.clone()))?)),
    DslValue::Handle(handle) => Ok(LuaValue::UserData(lua.create_userdata(HandleValue(handle.clone()))?)),
  }
}
