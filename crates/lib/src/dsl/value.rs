use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::types::HandleKind;

/// A file known to the build, identified by its path relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artifact {
  path: String,
}

impl Artifact {
  pub fn new(path: impl Into<String>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  /// Final path component.
  pub fn basename(&self) -> &str {
    self.path.rsplit('/').next().unwrap_or(&self.path)
  }
}

impl fmt::Display for Artifact {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "<File {}>", self.path)
  }
}

/// A native object exposed to the DSL as an opaque value.
pub trait NativeHandle: fmt::Debug + Send + Sync + 'static {
  fn kind(&self) -> HandleKind;

  /// Read-only attribute access from the DSL.
  fn field(&self, _name: &str) -> Option<DslValue> {
    None
  }

  fn as_any(&self) -> &dyn Any;
}

/// Shared reference to a native handle. Equality is identity.
#[derive(Debug, Clone)]
pub struct Handle(Arc<dyn NativeHandle>);

impl Handle {
  pub fn new<T: NativeHandle>(value: T) -> Self {
    Handle(Arc::new(value))
  }

  pub fn kind(&self) -> HandleKind {
    self.0.kind()
  }

  pub fn field(&self, name: &str) -> Option<DslValue> {
    self.0.field(name)
  }

  pub fn downcast<T: NativeHandle>(&self) -> Option<&T> {
    self.0.as_any().downcast_ref::<T>()
  }
}

impl PartialEq for Handle {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

/// An immutable, insertion-ordered set of values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Depset {
  items: Vec<DslValue>,
}

impl Depset {
  pub fn new(items: impl IntoIterator<Item = DslValue>) -> Self {
    let mut depset = Depset::default();
    let mut seen_files = HashSet::new();
    for item in items {
      let first_seen = match &item {
        DslValue::File(file) => seen_files.insert(file.path.clone()),
        other => !depset.items.contains(other),
      };
      if first_seen {
        depset.items.push(item);
      }
    }
    depset
  }

  pub fn iter(&self) -> impl Iterator<Item = &DslValue> {
    self.items.iter()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn to_list(&self) -> Vec<DslValue> {
    self.items.clone()
  }
}

/// A value crossing the DSL boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum DslValue {
  None,
  Bool(bool),
  Int(i64),
  String(String),
  Sequence(Vec<DslValue>),
  Mapping(BTreeMap<String, DslValue>),
  Depset(Depset),
  File(Artifact),
  Handle(Handle),
}

impl DslValue {
  pub fn handle(value: impl NativeHandle) -> Self {
    DslValue::Handle(Handle::new(value))
  }

  /// Type name as shown to DSL users.
  pub fn type_name(&self) -> &'static str {
    match self {
      DslValue::None => "NoneType",
      DslValue::Bool(_) => "bool",
      DslValue::Int(_) => "int",
      DslValue::String(_) => "string",
      DslValue::Sequence(_) => "sequence",
      DslValue::Mapping(_) => "dict",
      DslValue::Depset(_) => "depset",
      DslValue::File(_) => "File",
      DslValue::Handle(handle) => handle.kind().type_name(),
    }
  }

  pub fn is_none(&self) -> bool {
    matches!(self, DslValue::None)
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      DslValue::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      DslValue::Int(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      DslValue::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_file(&self) -> Option<&Artifact> {
    match self {
      DslValue::File(file) => Some(file),
      _ => None,
    }
  }

  pub fn as_handle<T: NativeHandle>(&self) -> Option<&T> {
    match self {
      DslValue::Handle(handle) => handle.downcast::<T>(),
      _ => None,
    }
  }
}

impl From<Artifact> for DslValue {
  fn from(value: Artifact) -> Self {
    DslValue::File(value)
  }
}

impl From<&str> for DslValue {
  fn from(value: &str) -> Self {
    DslValue::String(value.to_string())
  }
}
