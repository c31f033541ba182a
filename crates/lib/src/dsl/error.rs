use thiserror::Error;

/// Errors raised to the DSL caller by native operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DslError {
  /// The arguments did not match the operation's signature.
  #[error("{operation}: {message}")]
  Type { operation: String, message: String },

  /// The arguments were well-typed but semantically invalid.
  #[error("{operation}: {message}")]
  Eval { operation: String, message: String },

  #[error("evaluation interrupted")]
  Interrupted,
}

impl DslError {
  pub fn type_error(operation: &str, message: impl Into<String>) -> Self {
    DslError::Type {
      operation: operation.to_string(),
      message: message.into(),
    }
  }

  pub fn eval_error(operation: &str, message: impl Into<String>) -> Self {
    DslError::Eval {
      operation: operation.to_string(),
      message: message.into(),
    }
  }

  pub fn is_type_error(&self) -> bool {
    matches!(self, DslError::Type { .. })
  }

  pub fn is_eval_error(&self) -> bool {
    matches!(self, DslError::Eval { .. })
  }

  /// Find a `DslError` raised inside a Lua callback.
  pub fn from_lua(err: &mlua::Error) -> Option<&DslError> {
    match err {
      mlua::Error::ExternalError(inner) => inner.downcast_ref::<DslError>(),
      mlua::Error::CallbackError { cause, .. } => DslError::from_lua(cause),
      mlua::Error::WithContext { cause, .. } => DslError::from_lua(cause),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;

  #[test]
  fn display_includes_operation() {
    let err = DslError::type_error("cc_common.link", "missing mandatory parameter 'name'");
    assert_eq!(err.to_string(), "cc_common.link: missing mandatory parameter 'name'");
  }

  #[test]
  fn found_through_callback_chain() {
    let inner = mlua::Error::external(DslError::eval_error("cc_common.link", "bad language"));
    let wrapped = mlua::Error::CallbackError {
      traceback: String::new(),
      cause: Arc::new(inner),
    };
    let found = DslError::from_lua(&wrapped).unwrap();
    assert!(found.is_eval_error());
  }

  #[test]
  fn unrelated_errors_are_not_dsl_errors() {
    assert!(DslError::from_lua(&mlua::Error::runtime("boom")).is_none());
  }
}
