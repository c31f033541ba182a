//! Argument binding.
//!
//! Matches a call's positional and named arguments against an
//! [`OperationDescriptor`], type-checks supplied values, and fills in defaults.
//! Omitted parameters whose default is [`DefaultValue::Unbound`] bind to
//! [`Arg::Unbound`], which stays distinct from an explicitly passed `None`.

use super::error::DslError;
use super::types::{DefaultValue, OperationDescriptor};
use super::value::DslValue;

/// Arguments as written at the call site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
  pub positional: Vec<DslValue>,
  pub named: Vec<(String, DslValue)>,
}

impl CallArgs {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn arg(mut self, value: impl Into<DslValue>) -> Self {
    self.positional.push(value.into());
    self
  }

  pub fn kwarg(mut self, name: &str, value: impl Into<DslValue>) -> Self {
    self.named.push((name.to_string(), value.into()));
    self
  }
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
  Value(DslValue),
  /// The caller omitted an optional parameter that has no default value.
  Unbound,
}

impl Arg {
  pub fn is_unbound(&self) -> bool {
    matches!(self, Arg::Unbound)
  }

  pub fn value(&self) -> Option<&DslValue> {
    match self {
      Arg::Value(value) => Some(value),
      Arg::Unbound => None,
    }
  }

  /// The value, or `None` when unbound or explicitly `None`.
  pub fn present(&self) -> Option<&DslValue> {
    self.value().filter(|v| !v.is_none())
  }
}

static UNBOUND: Arg = Arg::Unbound;

/// Arguments bound to an operation's parameters, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArgs {
  names: Vec<String>,
  args: Vec<Arg>,
}

impl BoundArgs {
  /// The bound argument for `name`. Unknown names read as unbound.
  pub fn get(&self, name: &str) -> &Arg {
    self
      .names
      .iter()
      .position(|n| n == name)
      .map(|i| &self.args[i])
      .unwrap_or(&UNBOUND)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Arg)> {
    self.names.iter().map(String::as_str).zip(self.args.iter())
  }
}

/// Bind `call` against `op`. `qualified` names the operation in error messages.
pub fn bind(op: &OperationDescriptor, qualified: &str, call: CallArgs) -> Result<BoundArgs, DslError> {
  let params = &op.parameters;
  let mut slots: Vec<Option<DslValue>> = vec![None; params.len()];

  let positional_slots: Vec<usize> = params
    .iter()
    .enumerate()
    .filter(|(_, p)| p.positional)
    .map(|(i, _)| i)
    .collect();
  if call.positional.len() > positional_slots.len() {
    return Err(DslError::type_error(
      qualified,
      format!(
        "accepts no more than {} positional argument(s) but got {}",
        positional_slots.len(),
        call.positional.len()
      ),
    ));
  }
  for (slot, value) in positional_slots.iter().zip(call.positional) {
    slots[*slot] = Some(value);
  }

  for (name, value) in call.named {
    let Some(index) = params.iter().position(|p| p.name == name) else {
      return Err(DslError::type_error(
        qualified,
        format!("unexpected keyword argument '{}'", name),
      ));
    };
    if !params[index].named {
      return Err(DslError::type_error(
        qualified,
        format!("parameter '{}' cannot be specified by keyword", name),
      ));
    }
    if slots[index].is_some() {
      return Err(DslError::type_error(
        qualified,
        format!("got multiple values for parameter '{}'", name),
      ));
    }
    slots[index] = Some(value);
  }

  let mut args = Vec::with_capacity(params.len());
  for (param, slot) in params.iter().zip(slots) {
    let arg = match slot {
      Some(value) => {
        if !param.accepts(&value) {
          return Err(DslError::type_error(
            qualified,
            format!(
              "parameter '{}' got value of type '{}', want '{}'",
              param.name,
              value.type_name(),
              param.allowed_types_display()
            ),
          ));
        }
        Arg::Value(value)
      }
      None => match &param.default {
        DefaultValue::Required => {
          return Err(DslError::type_error(
            qualified,
            format!("missing mandatory parameter '{}'", param.name),
          ));
        }
        DefaultValue::Unbound => Arg::Unbound,
        DefaultValue::Literal(literal) => Arg::Value(literal.to_value()),
      },
    };
    args.push(arg);
  }

  Ok(BoundArgs {
    names: params.iter().map(|p| p.name.clone()).collect(),
    args,
  })
}
