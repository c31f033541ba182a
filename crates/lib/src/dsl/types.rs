use std::fmt;

use serde::Serialize;

use super::value::DslValue;

/// Kinds of opaque native handles that cross the DSL boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
  Actions,
  FeatureConfiguration,
  CcToolchain,
  CompilationOutputs,
  LinkingContext,
  LinkingOutputs,
  LtoCompilationContext,
}

impl HandleKind {
  /// Name shown to DSL users in type errors and docs.
  pub fn type_name(&self) -> &'static str {
    match self {
      HandleKind::Actions => "actions",
      HandleKind::FeatureConfiguration => "FeatureConfiguration",
      HandleKind::CcToolchain => "CcToolchainInfo",
      HandleKind::CompilationOutputs => "CompilationOutputs",
      HandleKind::LinkingContext => "LinkingContext",
      HandleKind::LinkingOutputs => "LinkingOutputs",
      HandleKind::LtoCompilationContext => "LtoCompilationContext",
    }
  }
}

/// Element type constraint for sequences and depsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
  String,
  File,
  Handle(HandleKind),
}

impl ElementType {
  pub fn accepts(&self, value: &DslValue) -> bool {
    match (self, value) {
      (ElementType::String, DslValue::String(_)) => true,
      (ElementType::File, DslValue::File(_)) => true,
      (ElementType::Handle(kind), DslValue::Handle(handle)) => handle.kind() == *kind,
      _ => false,
    }
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      ElementType::String => "string",
      ElementType::File => "File",
      ElementType::Handle(kind) => kind.type_name(),
    }
  }
}

/// Runtime type tag a parameter may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum TypeTag {
  Any,
  None,
  Bool,
  Int,
  String,
  Sequence(Option<ElementType>),
  Mapping,
  Depset(Option<ElementType>),
  File,
  Handle(HandleKind),
}

impl TypeTag {
  pub fn accepts(&self, value: &DslValue) -> bool {
    match (self, value) {
      (TypeTag::Any, _) => true,
      (TypeTag::None, DslValue::None) => true,
      (TypeTag::Bool, DslValue::Bool(_)) => true,
      (TypeTag::Int, DslValue::Int(_)) => true,
      (TypeTag::String, DslValue::String(_)) => true,
      (TypeTag::Sequence(element), DslValue::Sequence(items)) => match element {
        Some(element) => items.iter().all(|item| element.accepts(item)),
        None => true,
      },
      (TypeTag::Mapping, DslValue::Mapping(_)) => true,
      // An empty Lua table is both an empty list and an empty dict.
      (TypeTag::Mapping, DslValue::Sequence(items)) => items.is_empty(),
      (TypeTag::Depset(element), DslValue::Depset(depset)) => match element {
        Some(element) => depset.iter().all(|item| element.accepts(item)),
        None => true,
      },
      (TypeTag::File, DslValue::File(_)) => true,
      (TypeTag::Handle(kind), DslValue::Handle(handle)) => handle.kind() == *kind,
      _ => false,
    }
  }
}

impl fmt::Display for TypeTag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TypeTag::Any => write!(f, "any"),
      TypeTag::None => write!(f, "NoneType"),
      TypeTag::Bool => write!(f, "bool"),
      TypeTag::Int => write!(f, "int"),
      TypeTag::String => write!(f, "string"),
      TypeTag::Sequence(None) => write!(f, "sequence"),
      TypeTag::Sequence(Some(element)) => write!(f, "sequence of {}", element.type_name()),
      TypeTag::Mapping => write!(f, "dict"),
      TypeTag::Depset(None) => write!(f, "depset"),
      TypeTag::Depset(Some(element)) => write!(f, "depset of {}", element.type_name()),
      TypeTag::File => write!(f, "File"),
      TypeTag::Handle(kind) => write!(f, "{}", kind.type_name()),
    }
  }
}

impl From<TypeTag> for String {
  fn from(tag: TypeTag) -> Self {
    tag.to_string()
  }
}

/// A literal default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
  None,
  Bool(bool),
  Int(i64),
  Str(String),
  EmptyList,
}

impl Literal {
  pub fn to_value(&self) -> DslValue {
    match self {
      Literal::None => DslValue::None,
      Literal::Bool(b) => DslValue::Bool(*b),
      Literal::Int(i) => DslValue::Int(*i),
      Literal::Str(s) => DslValue::String(s.clone()),
      Literal::EmptyList => DslValue::Sequence(Vec::new()),
    }
  }
}

impl fmt::Display for Literal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Literal::None => write!(f, "None"),
      Literal::Bool(true) => write!(f, "True"),
      Literal::Bool(false) => write!(f, "False"),
      Literal::Int(i) => write!(f, "{}", i),
      Literal::Str(s) => write!(f, "'{}'", s),
      Literal::EmptyList => write!(f, "[]"),
    }
  }
}

/// What happens when a caller omits a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "Option<String>")]
pub enum DefaultValue {
  /// The caller must supply the parameter.
  Required,
  /// Optional, but without a value: the implementation receives
  /// [`Arg::Unbound`](super::bind::Arg::Unbound) and decides internally.
  Unbound,
  Literal(Literal),
}

impl DefaultValue {
  pub fn is_required(&self) -> bool {
    matches!(self, DefaultValue::Required)
  }
}

impl fmt::Display for DefaultValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DefaultValue::Required => write!(f, "<required>"),
      DefaultValue::Unbound => write!(f, "unbound"),
      DefaultValue::Literal(literal) => write!(f, "{}", literal),
    }
  }
}

impl From<DefaultValue> for Option<String> {
  fn from(value: DefaultValue) -> Self {
    match value {
      DefaultValue::Required => None,
      other => Some(other.to_string()),
    }
  }
}

/// Describes one parameter of a DSL-callable operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamDescriptor {
  pub name: String,
  pub doc: String,
  pub positional: bool,
  pub named: bool,
  pub documented: bool,
  pub default: DefaultValue,
  pub allowed_types: Vec<TypeTag>,
}

impl ParamDescriptor {
  /// A required, keyword-only, documented parameter.
  pub fn named(name: &str, allowed_types: impl IntoIterator<Item = TypeTag>) -> Self {
    Self {
      name: name.to_string(),
      doc: String::new(),
      positional: false,
      named: true,
      documented: true,
      default: DefaultValue::Required,
      allowed_types: allowed_types.into_iter().collect(),
    }
  }

  /// A required parameter that may only be passed by position.
  pub fn positional_only(name: &str, allowed_types: impl IntoIterator<Item = TypeTag>) -> Self {
    Self {
      positional: true,
      named: false,
      ..Self::named(name, allowed_types)
    }
  }

  /// Also accept this parameter by position.
  pub fn positional(mut self) -> Self {
    self.positional = true;
    self
  }

  pub fn doc(mut self, doc: &str) -> Self {
    self.doc = doc.to_string();
    self
  }

  pub fn default(mut self, literal: Literal) -> Self {
    self.default = DefaultValue::Literal(literal);
    self
  }

  pub fn unbound(mut self) -> Self {
    self.default = DefaultValue::Unbound;
    self
  }

  pub fn undocumented(mut self) -> Self {
    self.documented = false;
    self
  }

  pub fn accepts(&self, value: &DslValue) -> bool {
    self.allowed_types.iter().any(|tag| tag.accepts(value))
  }

  /// Human readable list of accepted types, e.g. `CompilationOutputs or NoneType`.
  pub fn allowed_types_display(&self) -> String {
    self
      .allowed_types
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>()
      .join(" or ")
  }
}

/// Opaque tag describing what an operation returns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReturnKind(String);

impl ReturnKind {
  pub fn new(kind: &str) -> Self {
    ReturnKind(kind.to_string())
  }

  pub fn none() -> Self {
    ReturnKind::new("none")
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

/// Describes an operation a native module exposes to the DSL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationDescriptor {
  pub name: String,
  pub doc: String,
  pub parameters: Vec<ParamDescriptor>,
  pub return_kind: ReturnKind,
  pub uses_evaluation_context: bool,
  pub documented: bool,
  /// Identity of the native entry point. Two descriptors with the same target
  /// describe the same implementation.
  #[serde(skip)]
  pub target: String,
}

impl OperationDescriptor {
  pub fn new(name: &str, target: &str) -> Self {
    Self {
      name: name.to_string(),
      doc: String::new(),
      parameters: Vec::new(),
      return_kind: ReturnKind::none(),
      uses_evaluation_context: false,
      documented: true,
      target: target.to_string(),
    }
  }

  pub fn doc(mut self, doc: &str) -> Self {
    self.doc = doc.to_string();
    self
  }

  pub fn param(mut self, param: ParamDescriptor) -> Self {
    self.parameters.push(param);
    self
  }

  pub fn returns(mut self, kind: ReturnKind) -> Self {
    self.return_kind = kind;
    self
  }

  pub fn uses_evaluation_context(mut self) -> Self {
    self.uses_evaluation_context = true;
    self
  }

  pub fn undocumented(mut self) -> Self {
    self.documented = false;
    self
  }

  pub fn parameter(&self, name: &str) -> Option<&ParamDescriptor> {
    self.parameters.iter().find(|p| p.name == name)
  }

  pub fn documented_parameters(&self) -> impl Iterator<Item = &ParamDescriptor> {
    self.parameters.iter().filter(|p| p.documented)
  }

  /// The name extended with parameter names, used once the name is overloaded.
  pub fn disambiguated_name(&self) -> String {
    let params: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
    format!("{}({})", self.name, params.join(", "))
  }

  /// Call signature for docs, e.g. `link(name, stamp=0)`.
  pub fn signature(&self) -> String {
    let params: Vec<String> = self
      .documented_parameters()
      .map(|p| match &p.default {
        DefaultValue::Required => p.name.clone(),
        default => format!("{}={}", p.name, default),
      })
      .collect();
    format!("{}({})", self.name, params.join(", "))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dsl::value::Artifact;

  mod type_tags {
    use super::*;

    #[test]
    fn typed_sequence_checks_every_element() {
      let tag = TypeTag::Sequence(Some(ElementType::String));
      assert!(tag.accepts(&DslValue::Sequence(vec![DslValue::String("-lm".into())])));
      assert!(!tag.accepts(&DslValue::Sequence(vec![DslValue::Int(1)])));
      assert!(tag.accepts(&DslValue::Sequence(vec![])));
    }

    #[test]
    fn none_tag_only_accepts_explicit_none() {
      assert!(TypeTag::None.accepts(&DslValue::None));
      assert!(!TypeTag::None.accepts(&DslValue::Bool(false)));
    }

    #[test]
    fn empty_table_is_an_empty_dict() {
      assert!(TypeTag::Mapping.accepts(&DslValue::Sequence(vec![])));
      assert!(!TypeTag::Mapping.accepts(&DslValue::Sequence(vec![DslValue::Int(1)])));
    }

    #[test]
    fn file_tag_accepts_artifacts() {
      assert!(TypeTag::File.accepts(&DslValue::File(Artifact::new("a.o"))));
      assert!(!TypeTag::File.accepts(&DslValue::String("a.o".into())));
    }

    #[test]
    fn display_names() {
      assert_eq!(TypeTag::Sequence(Some(ElementType::String)).to_string(), "sequence of string");
      assert_eq!(TypeTag::Handle(HandleKind::CcToolchain).to_string(), "CcToolchainInfo");
      assert_eq!(TypeTag::None.to_string(), "NoneType");
    }
  }

  mod descriptors {
    use super::*;

    fn foo(params: &[&str]) -> OperationDescriptor {
      params.iter().fold(OperationDescriptor::new("foo", "Foo::foo"), |op, p| {
        op.param(ParamDescriptor::named(p, [TypeTag::Any]))
      })
    }

    #[test]
    fn disambiguated_name_lists_parameters() {
      assert_eq!(foo(&["x"]).disambiguated_name(), "foo(x)");
      assert_eq!(foo(&["x", "y"]).disambiguated_name(), "foo(x, y)");
      assert_eq!(foo(&[]).disambiguated_name(), "foo()");
    }

    #[test]
    fn signature_shows_documented_defaults() {
      let op = OperationDescriptor::new("link", "Cc::link")
        .param(ParamDescriptor::named("name", [TypeTag::String]))
        .param(ParamDescriptor::named("stamp", [TypeTag::Int]).default(Literal::Int(0)))
        .param(ParamDescriptor::named("pdb_file", [TypeTag::Any]).unbound().undocumented());
      assert_eq!(op.signature(), "link(name, stamp=0)");
    }

    #[test]
    fn literal_display_matches_dsl_syntax() {
      assert_eq!(Literal::Str("c++".into()).to_string(), "'c++'");
      assert_eq!(Literal::Bool(true).to_string(), "True");
      assert_eq!(Literal::EmptyList.to_string(), "[]");
      assert_eq!(DefaultValue::Unbound.to_string(), "unbound");
    }

    #[test]
    fn positional_only_is_not_named() {
      let p = ParamDescriptor::positional_only("x", [TypeTag::Int]);
      assert!(p.positional);
      assert!(!p.named);
    }
  }
}
