use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::consts::{DOC_SOURCE_ROOT, NO_SOURCE_FILE};
use crate::dsl::OperationDescriptor;
use crate::util::collation::{Collated, compare};

/// Errors raised while assembling module documentation.
///
/// These indicate a bug in the code registering the module.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocError {
  #[error("module '{module}': two distinct implementations are documented as '{name}'")]
  DistinctOverloads { module: String, name: String },

  #[error("module '{module}': constructor already set to '{existing}', cannot set '{attempted}'")]
  ConstructorAlreadySet {
    module: String,
    existing: String,
    attempted: String,
  },
}

/// A documented operation as recorded in a [`ModuleDoc`].
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDoc {
  descriptor: Arc<OperationDescriptor>,
  overloaded: bool,
}

impl MethodDoc {
  fn new(descriptor: Arc<OperationDescriptor>, overloaded: bool) -> Self {
    Self { descriptor, overloaded }
  }

  /// Short name, or the disambiguated name when overloaded.
  pub fn name(&self) -> String {
    if self.overloaded {
      self.descriptor.disambiguated_name()
    } else {
      self.descriptor.name.clone()
    }
  }

  pub fn short_name(&self) -> &str {
    &self.descriptor.name
  }

  pub fn is_overloaded(&self) -> bool {
    self.overloaded
  }

  pub fn descriptor(&self) -> &OperationDescriptor {
    &self.descriptor
  }
}

/// Documentation for one built-in module of the config language.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDoc {
  name: String,
  title: String,
  raw_doc: String,
  top_level: bool,
  backing_type: String,
  methods: BTreeMap<Collated, MethodDoc>,
  /// Short name to the keys of every method sharing it.
  overloads: HashMap<String, Vec<Collated>>,
  constructor: Option<MethodDoc>,
}

impl ModuleDoc {
  pub fn new(name: &str, title: &str, raw_doc: &str, top_level: bool, backing_type: &str) -> Self {
    Self {
      name: name.to_string(),
      title: title.to_string(),
      raw_doc: raw_doc.to_string(),
      top_level,
      backing_type: backing_type.to_string(),
      methods: BTreeMap::new(),
      overloads: HashMap::new(),
      constructor: None,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn raw_doc(&self) -> &str {
    &self.raw_doc
  }

  pub fn is_top_level(&self) -> bool {
    self.top_level
  }

  pub fn backing_type(&self) -> &str {
    &self.backing_type
  }

  /// Record a documented operation. Undocumented descriptors are ignored.
  ///
  /// Once a second operation with the same short name arrives, both are
  /// marked overloaded and keyed by their disambiguated names. Adding the same
  /// implementation twice is a no-op.
  pub fn add_operation(&mut self, descriptor: Arc<OperationDescriptor>) -> Result<(), DocError> {
    if !descriptor.documented {
      return Ok(());
    }

    let disambiguated = descriptor.disambiguated_name();
    let siblings = self.overloads.get(&descriptor.name).cloned().unwrap_or_default();
    for key in &siblings {
      let Some(existing) = self.methods.get(key) else {
        continue;
      };
      if existing.descriptor.disambiguated_name() != disambiguated {
        continue;
      }
      if existing.descriptor.target == descriptor.target {
        return Ok(());
      }
      return Err(DocError::DistinctOverloads {
        module: self.name.clone(),
        name: disambiguated,
      });
    }

    let overloaded = !siblings.is_empty();
    if siblings.len() == 1 {
      // The first method was keyed by its short name before the conflict was known.
      let first_key = &siblings[0];
      if let Some(mut first) = self.methods.remove(first_key) {
        first.overloaded = true;
        let rekeyed = Collated(first.name());
        debug!(module = %self.name, from = %first_key.as_str(), to = %rekeyed.as_str(), "operation overloaded");
        self.methods.insert(rekeyed.clone(), first);
        self.overloads.insert(descriptor.name.clone(), vec![rekeyed]);
      }
    }

    let method = MethodDoc::new(descriptor, overloaded);
    let key = Collated(method.name());
    self
      .overloads
      .entry(method.short_name().to_string())
      .or_default()
      .push(key.clone());
    self.methods.insert(key, method);
    Ok(())
  }

  /// Set the operation invoked by calling the module itself.
  pub fn set_constructor(&mut self, descriptor: Arc<OperationDescriptor>) -> Result<(), DocError> {
    if let Some(existing) = &self.constructor {
      return Err(DocError::ConstructorAlreadySet {
        module: self.name.clone(),
        existing: existing.name(),
        attempted: descriptor.name.clone(),
      });
    }
    self.constructor = Some(MethodDoc::new(descriptor, false));
    Ok(())
  }

  pub fn constructor(&self) -> Option<&MethodDoc> {
    self.constructor.as_ref()
  }

  /// Look up a method by its recorded (possibly disambiguated) name.
  pub fn method(&self, name: &str) -> Option<&MethodDoc> {
    self.methods.get(&Collated::from(name))
  }

  pub fn has_operations(&self) -> bool {
    !self.methods.is_empty()
  }

  /// The constructor, if any, followed by every method in collated order.
  pub fn list_methods(&self) -> Vec<&MethodDoc> {
    self.constructor.iter().chain(self.methods.values()).collect()
  }

  /// The constructor and every method, sorted together by recorded name.
  pub fn list_all_documented(&self) -> Vec<&MethodDoc> {
    let mut all: Vec<(String, &MethodDoc)> = self
      .constructor
      .iter()
      .chain(self.methods.values())
      .map(|m| (m.name(), m))
      .collect();
    all.sort_by(|(a, _), (b, _)| compare(a, b));
    all.into_iter().map(|(_, m)| m).collect()
  }

  /// Path of the source file defining the module, or `NONE` for top-level modules.
  ///
  /// Nested type suffixes (after the first `$`) are dropped: `p.q.Outer$Inner`
  /// maps to `src/main/java/p/q/Outer.java`.
  pub fn source_file_path(&self) -> String {
    if self.top_level {
      return NO_SOURCE_FILE.to_string();
    }
    let outer = self.backing_type.split('$').next().unwrap_or_default();
    format!("{}/{}.java", DOC_SOURCE_ROOT, outer.replace('.', "/"))
  }
}
