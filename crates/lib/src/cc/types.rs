use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dsl::{Artifact, DslValue, HandleKind, NativeHandle};

fn files(artifacts: &[Artifact]) -> DslValue {
  DslValue::Sequence(artifacts.iter().cloned().map(DslValue::File).collect())
}

/// Action factory of the rule being evaluated. Outputs are declared relative
/// to the owning target's package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFactory {
  label: String,
}

impl ActionFactory {
  pub fn new(label: &str) -> Self {
    Self {
      label: label.to_string(),
    }
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  /// Package directory of the owning label: `//a/b:c` becomes `a/b`.
  pub fn package(&self) -> &str {
    let path = self.label.trim_start_matches("//");
    path.split(':').next().unwrap_or_default()
  }

  /// Declare an output file named `name` in the owning package.
  pub fn declare_file(&self, name: &str) -> Artifact {
    match self.package() {
      "" => Artifact::new(name),
      package => Artifact::new(format!("{}/{}", package, name)),
    }
  }
}

impl NativeHandle for ActionFactory {
  fn kind(&self) -> HandleKind {
    HandleKind::Actions
  }

  fn field(&self, name: &str) -> Option<DslValue> {
    match name {
      "label" => Some(DslValue::String(self.label.clone())),
      _ => None,
    }
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

/// The set of enabled toolchain features.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureConfiguration {
  features: BTreeSet<String>,
}

impl FeatureConfiguration {
  pub fn new(features: impl IntoIterator<Item = String>) -> Self {
    Self {
      features: features.into_iter().collect(),
    }
  }

  pub fn is_enabled(&self, feature: &str) -> bool {
    self.features.contains(feature)
  }

  pub fn features(&self) -> impl Iterator<Item = &str> {
    self.features.iter().map(String::as_str)
  }
}

impl NativeHandle for FeatureConfiguration {
  fn kind(&self) -> HandleKind {
    HandleKind::FeatureConfiguration
  }

  fn field(&self, name: &str) -> Option<DslValue> {
    match name {
      "features" => Some(DslValue::Sequence(self.features().map(DslValue::from).collect())),
      _ => None,
    }
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

/// The C++ toolchain selected for the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcToolchain {
  pub identifier: String,
  pub cpu: String,
  pub compiler: String,
  /// Appended to executable names, e.g. `.exe`. Empty on Unix.
  pub executable_extension: String,
  /// Dynamic library extension without the dot, e.g. `so`.
  pub dynamic_library_extension: String,
}

impl Default for CcToolchain {
  fn default() -> Self {
    Self {
      identifier: "local".to_string(),
      cpu: "k8".to_string(),
      compiler: "gcc".to_string(),
      executable_extension: String::new(),
      dynamic_library_extension: "so".to_string(),
    }
  }
}

impl NativeHandle for CcToolchain {
  fn kind(&self) -> HandleKind {
    HandleKind::CcToolchain
  }

  fn field(&self, name: &str) -> Option<DslValue> {
    match name {
      "toolchain_id" => Some(DslValue::String(self.identifier.clone())),
      "cpu" => Some(DslValue::String(self.cpu.clone())),
      "compiler" => Some(DslValue::String(self.compiler.clone())),
      _ => None,
    }
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

/// Object files produced by compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationOutputs {
  pub objects: Vec<Artifact>,
  pub pic_objects: Vec<Artifact>,
  pub lto_compilation_context: Option<LtoCompilationContext>,
}

impl NativeHandle for CompilationOutputs {
  fn kind(&self) -> HandleKind {
    HandleKind::CompilationOutputs
  }

  fn field(&self, name: &str) -> Option<DslValue> {
    match name {
      "objects" => Some(files(&self.objects)),
      "pic_objects" => Some(files(&self.pic_objects)),
      _ => None,
    }
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

/// Bitcode produced for link time optimization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LtoCompilationContext {
  pub bitcode_files: Vec<Artifact>,
}

impl NativeHandle for LtoCompilationContext {
  fn kind(&self) -> HandleKind {
    HandleKind::LtoCompilationContext
  }

  fn field(&self, name: &str) -> Option<DslValue> {
    match name {
      "bitcode_files" => Some(files(&self.bitcode_files)),
      _ => None,
    }
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

/// Libraries and flags a dependent link picks up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkingContext {
  pub libraries: Vec<Artifact>,
  pub user_link_flags: Vec<String>,
}

impl NativeHandle for LinkingContext {
  fn kind(&self) -> HandleKind {
    HandleKind::LinkingContext
  }

  fn field(&self, name: &str) -> Option<DslValue> {
    match name {
      "libraries" => Some(files(&self.libraries)),
      "user_link_flags" => Some(DslValue::Sequence(
        self.user_link_flags.iter().map(|f| DslValue::from(f.as_str())).collect(),
      )),
      _ => None,
    }
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

/// Result of a link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkingOutputs {
  pub executable: Option<Artifact>,
  pub library_to_link: Option<Artifact>,
  /// Context for linking against the produced dynamic library.
  pub linking_context: Option<LinkingContext>,
}

impl NativeHandle for LinkingOutputs {
  fn kind(&self) -> HandleKind {
    HandleKind::LinkingOutputs
  }

  fn field(&self, name: &str) -> Option<DslValue> {
    let or_none = |file: &Option<Artifact>| file.clone().map_or(DslValue::None, DslValue::File);
    match name {
      "executable" => Some(or_none(&self.executable)),
      "library_to_link" => Some(or_none(&self.library_to_link)),
      "linking_context" => Some(
        self
          .linking_context
          .clone()
          .map_or(DslValue::None, DslValue::handle),
      ),
      _ => None,
    }
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

/// Kind of artifact a link produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
  Executable,
  DynamicLibrary,
}

impl FromStr for OutputType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "executable" => Ok(OutputType::Executable),
      "dynamic_library" => Ok(OutputType::DynamicLibrary),
      other => Err(format!(
        "output_type must be 'executable' or 'dynamic_library', got '{}'",
        other
      )),
    }
  }
}

impl fmt::Display for OutputType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OutputType::Executable => write!(f, "executable"),
      OutputType::DynamicLibrary => write!(f, "dynamic_library"),
    }
  }
}

/// Whether build information is embedded into the linked binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stamp {
  /// `1`
  Always,
  /// `0`
  Never,
  /// `-1`: follow the global stamping flag.
  Default,
}

impl TryFrom<i64> for Stamp {
  type Error = String;

  fn try_from(value: i64) -> Result<Self, Self::Error> {
    match value {
      1 => Ok(Stamp::Always),
      0 => Ok(Stamp::Never),
      -1 => Ok(Stamp::Default),
      other => Err(format!("stamp must be -1, 0 or 1, got {}", other)),
    }
  }
}
