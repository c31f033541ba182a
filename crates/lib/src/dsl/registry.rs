//! Registry of native modules exposed to the config language.
//!
//! The registry is built explicitly at startup, then shared read-only (usually
//! behind an `Arc`) by every evaluation. Each registered module yields a
//! [`ModuleDoc`] for documentation and a table of descriptors for dispatch.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use super::bind::{BoundArgs, CallArgs, bind};
use super::error::DslError;
use super::thread::EvalThread;
use super::types::OperationDescriptor;
use super::value::DslValue;
use crate::doc::{DocError, ModuleDoc};

/// Errors raised while registering a module. These indicate a bug in the module.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
  #[error(transparent)]
  Doc(#[from] DocError),

  #[error("module '{0}' is already registered")]
  DuplicateModule(String),

  #[error("{operation}: parameter '{parameter}' accepts no types")]
  EmptyAllowedTypes { operation: String, parameter: String },

  #[error("{operation}: parameter '{parameter}' is declared twice")]
  DuplicateParameter { operation: String, parameter: String },
}

/// Static description of a native module.
#[derive(Debug, Clone)]
pub struct ModuleDefinition {
  pub name: String,
  pub title: String,
  pub doc: String,
  pub top_level: bool,
  /// Host type implementing the module, used to locate its source for docs.
  pub backing_type: String,
  pub operations: Vec<OperationDescriptor>,
  pub constructor: Option<OperationDescriptor>,
}

/// A module implemented natively and callable from the config language.
pub trait NativeModule: Send + Sync {
  fn definition(&self) -> ModuleDefinition;

  /// Run the operation described by `op` with arguments already bound to it.
  ///
  /// `thread` is present exactly when `op.uses_evaluation_context` is set.
  fn call(&self, op: &OperationDescriptor, args: &BoundArgs, thread: Option<&EvalThread>) -> Result<DslValue, DslError>;
}

/// A module after registration.
pub struct RegisteredModule {
  name: String,
  doc: ModuleDoc,
  operations: Vec<Arc<OperationDescriptor>>,
  constructor: Option<Arc<OperationDescriptor>>,
  native: Arc<dyn NativeModule>,
}

impl std::fmt::Debug for RegisteredModule {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RegisteredModule")
      .field("name", &self.name)
      .field("operations", &self.operations.len())
      .finish()
  }
}

impl RegisteredModule {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn doc(&self) -> &ModuleDoc {
    &self.doc
  }

  pub fn has_constructor(&self) -> bool {
    self.constructor.is_some()
  }

  /// Distinct short names in registration order.
  pub fn operation_names(&self) -> Vec<&str> {
    let mut seen = HashSet::new();
    self
      .operations
      .iter()
      .map(|op| op.name.as_str())
      .filter(|name| seen.insert(*name))
      .collect()
  }

  /// Every descriptor registered under `name`, in registration order.
  pub fn overloads(&self, name: &str) -> impl Iterator<Item = &Arc<OperationDescriptor>> {
    self.operations.iter().filter(move |op| op.name == name)
  }

  /// Bind and dispatch a call to the operation `name`.
  pub fn invoke(&self, name: &str, call: CallArgs, thread: &EvalThread) -> Result<DslValue, DslError> {
    let candidates: Vec<&Arc<OperationDescriptor>> = self.overloads(name).collect();
    let qualified = format!("{}.{}", self.name, name);
    self.dispatch(&qualified, &candidates, call, thread)
  }

  /// Bind and dispatch a call of the module itself.
  pub fn invoke_constructor(&self, call: CallArgs, thread: &EvalThread) -> Result<DslValue, DslError> {
    let candidates: Vec<&Arc<OperationDescriptor>> = self.constructor.iter().collect();
    self.dispatch(&self.name, &candidates, call, thread)
  }

  fn dispatch(
    &self,
    qualified: &str,
    candidates: &[&Arc<OperationDescriptor>],
    call: CallArgs,
    thread: &EvalThread,
  ) -> Result<DslValue, DslError> {
    thread.interrupt().check()?;

    let mut first_error = None;
    for op in candidates {
      match bind(op, qualified, call.clone()) {
        Ok(args) => {
          trace!(operation = %qualified, target = %op.target, thread = %thread.name(), "dispatch");
          let context = op.uses_evaluation_context.then_some(thread);
          return self.native.call(op, &args, context);
        }
        Err(err) => {
          first_error.get_or_insert(err);
        }
      }
    }

    match (candidates.len(), first_error) {
      (0, _) | (_, None) => Err(DslError::type_error(qualified, "no such operation")),
      (1, Some(err)) => Err(err),
      (n, Some(err)) => Err(DslError::type_error(
        qualified,
        format!("no overload among {} accepts these arguments (first: {})", n, err),
      )),
    }
  }
}

/// All native modules available to evaluations.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
  modules: Vec<RegisteredModule>,
}

impl ModuleRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Validate and register a module, assembling its documentation.
  pub fn register(&mut self, native: Arc<dyn NativeModule>) -> Result<(), RegistryError> {
    let definition = native.definition();
    if self.get(&definition.name).is_some() {
      return Err(RegistryError::DuplicateModule(definition.name));
    }

    let mut doc = ModuleDoc::new(
      &definition.name,
      &definition.title,
      &definition.doc,
      definition.top_level,
      &definition.backing_type,
    );

    let mut operations = Vec::with_capacity(definition.operations.len());
    for op in definition.operations {
      validate(&definition.name, &op)?;
      let op = Arc::new(op);
      doc.add_operation(op.clone())?;
      operations.push(op);
    }

    let constructor = match definition.constructor {
      Some(op) => {
        validate(&definition.name, &op)?;
        let op = Arc::new(op);
        doc.set_constructor(op.clone())?;
        Some(op)
      }
      None => None,
    };

    debug!(module = %definition.name, operations = operations.len(), "registered native module");
    self.modules.push(RegisteredModule {
      name: definition.name,
      doc,
      operations,
      constructor,
      native,
    });
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<&RegisteredModule> {
    self.modules.iter().find(|m| m.name == name)
  }

  /// Modules in registration order.
  pub fn modules(&self) -> impl Iterator<Item = &RegisteredModule> {
    self.modules.iter()
  }

  pub fn docs(&self) -> impl Iterator<Item = &ModuleDoc> {
    self.modules.iter().map(|m| &m.doc)
  }
}

fn validate(module: &str, op: &OperationDescriptor) -> Result<(), RegistryError> {
  let qualified = format!("{}.{}", module, op.name);
  let mut seen = HashSet::new();
  for param in &op.parameters {
    if param.allowed_types.is_empty() {
      return Err(RegistryError::EmptyAllowedTypes {
        operation: qualified,
        parameter: param.name.clone(),
      });
    }
    if !seen.insert(param.name.as_str()) {
      return Err(RegistryError::DuplicateParameter {
        operation: qualified,
        parameter: param.name.clone(),
      });
    }
  }
  Ok(())
}
