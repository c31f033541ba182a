use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::TOOLCHAIN_RESOLUTION;
use crate::util::hash::{HashError, Hashable, ObjectHash};

/// Errors raised while constructing keys.
///
/// These indicate misuse by the caller building the key and are not expected
/// to be recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
  #[error("invalid argument: configuration must be set before build()")]
  MissingConfiguration,

  #[error("invalid argument: label must not be empty")]
  EmptyLabel,

  #[error("invalid argument: label '{0}' must not contain whitespace")]
  MalformedLabel(String),
}

/// A target label such as `//platforms:linux_x86_64`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(String);

impl Label {
  pub fn new(value: impl Into<String>) -> Result<Self, KeyError> {
    let value = value.into();
    if value.is_empty() {
      return Err(KeyError::EmptyLabel);
    }
    if value.chars().any(char::is_whitespace) {
      return Err(KeyError::MalformedLabel(value));
    }
    Ok(Label(value))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl TryFrom<String> for Label {
  type Error = KeyError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Label::new(value)
  }
}

impl From<Label> for String {
  fn from(label: Label) -> Self {
    label.0
  }
}

impl FromStr for Label {
  type Err = KeyError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Label::new(s)
  }
}

impl fmt::Display for Label {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Opaque identifier of a build configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigurationId(String);

impl ConfigurationId {
  pub fn new(id: impl Into<String>) -> Self {
    ConfigurationId(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ConfigurationId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A toolchain type a target needs, and whether resolution must find one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ToolchainTypeRequirement {
  toolchain_type: Label,
  mandatory: bool,
}

impl ToolchainTypeRequirement {
  pub fn mandatory(toolchain_type: Label) -> Self {
    Self {
      toolchain_type,
      mandatory: true,
    }
  }

  pub fn optional(toolchain_type: Label) -> Self {
    Self {
      toolchain_type,
      mandatory: false,
    }
  }

  pub fn toolchain_type(&self) -> &Label {
    &self.toolchain_type
  }

  pub fn is_mandatory(&self) -> bool {
    self.mandatory
  }
}

impl fmt::Display for ToolchainTypeRequirement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.mandatory {
      write!(f, "{}", self.toolchain_type)
    } else {
      write!(f, "{} (optional)", self.toolchain_type)
    }
  }
}

/// Name of the planner function a key is evaluated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionName(&'static str);

impl FunctionName {
  pub const TOOLCHAIN_RESOLUTION: FunctionName = FunctionName(TOOLCHAIN_RESOLUTION);

  pub fn as_str(&self) -> &'static str {
    self.0
  }
}

impl fmt::Display for FunctionName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A key the planner memoizes results under.
pub trait PlannerKey: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {
  /// The planner function that computes values for this key.
  fn function_name(&self) -> FunctionName;

  /// Scheduling hint: computing this key is expensive enough that admission
  /// should weigh it. Never affects the computed value.
  fn is_cpu_heavy(&self) -> bool {
    false
  }
}

/// Identity of a toolchain resolution request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolchainRequestKey {
  configuration: ConfigurationId,
  toolchain_types: BTreeSet<ToolchainTypeRequirement>,
  exec_constraint_labels: BTreeSet<Label>,
  force_execution_platform: Option<Label>,
  debug_target: bool,
}

impl ToolchainRequestKey {
  /// Start a key with empty sets, no forced platform and debugging off.
  pub fn builder() -> ToolchainRequestKeyBuilder {
    ToolchainRequestKeyBuilder::default()
  }

  pub fn configuration(&self) -> &ConfigurationId {
    &self.configuration
  }

  pub fn toolchain_types(&self) -> &BTreeSet<ToolchainTypeRequirement> {
    &self.toolchain_types
  }

  pub fn exec_constraint_labels(&self) -> &BTreeSet<Label> {
    &self.exec_constraint_labels
  }

  /// `None` means the execution platform is selected automatically.
  pub fn force_execution_platform(&self) -> Option<&Label> {
    self.force_execution_platform.as_ref()
  }

  pub fn debug_target(&self) -> bool {
    self.debug_target
  }

  /// Stable short identity of this key, independent of insertion order.
  pub fn fingerprint(&self) -> Result<ObjectHash, HashError> {
    self.compute_hash()
  }
}

impl Hashable for ToolchainRequestKey {}

impl PlannerKey for ToolchainRequestKey {
  fn function_name(&self) -> FunctionName {
    FunctionName::TOOLCHAIN_RESOLUTION
  }

  // Resolution may cause package loading.
  fn is_cpu_heavy(&self) -> bool {
    true
  }
}

impl fmt::Display for ToolchainRequestKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let types: Vec<String> = self.toolchain_types.iter().map(ToString::to_string).collect();
    let constraints: Vec<&str> = self.exec_constraint_labels.iter().map(Label::as_str).collect();
    write!(
      f,
      "{}(configuration={}, toolchain_types=[{}], exec_constraints=[{}]",
      self.function_name(),
      self.configuration,
      types.join(", "),
      constraints.join(", ")
    )?;
    if let Some(platform) = &self.force_execution_platform {
      write!(f, ", force_execution_platform={}", platform)?;
    }
    if self.debug_target {
      write!(f, ", debug")?;
    }
    write!(f, ")")
  }
}

/// Builder for [`ToolchainRequestKey`].
#[derive(Debug, Clone, Default)]
pub struct ToolchainRequestKeyBuilder {
  configuration: Option<ConfigurationId>,
  toolchain_types: BTreeSet<ToolchainTypeRequirement>,
  exec_constraint_labels: BTreeSet<Label>,
  force_execution_platform: Option<Label>,
  debug_target: bool,
}

impl ToolchainRequestKeyBuilder {
  pub fn configuration(mut self, configuration: ConfigurationId) -> Self {
    self.configuration = Some(configuration);
    self
  }

  /// Replace the toolchain types. Accepts a set or a plain list.
  pub fn toolchain_types(mut self, types: impl IntoIterator<Item = ToolchainTypeRequirement>) -> Self {
    self.toolchain_types = types.into_iter().collect();
    self
  }

  pub fn toolchain_type(mut self, requirement: ToolchainTypeRequirement) -> Self {
    self.toolchain_types.insert(requirement);
    self
  }

  /// Replace the execution constraints. Accepts a set or a plain list.
  pub fn exec_constraint_labels(mut self, labels: impl IntoIterator<Item = Label>) -> Self {
    self.exec_constraint_labels = labels.into_iter().collect();
    self
  }

  pub fn exec_constraint_label(mut self, label: Label) -> Self {
    self.exec_constraint_labels.insert(label);
    self
  }

  pub fn force_execution_platform(self, platform: Label) -> Self {
    self.maybe_force_execution_platform(Some(platform))
  }

  pub fn maybe_force_execution_platform(mut self, platform: Option<Label>) -> Self {
    self.force_execution_platform = platform;
    self
  }

  pub fn debug_target(mut self, flag: bool) -> Self {
    self.debug_target = flag;
    self
  }

  pub fn debug(self) -> Self {
    self.debug_target(true)
  }

  pub fn build(self) -> Result<ToolchainRequestKey, KeyError> {
    let configuration = self.configuration.ok_or(KeyError::MissingConfiguration)?;
    Ok(ToolchainRequestKey {
      configuration,
      toolchain_types: self.toolchain_types,
      exec_constraint_labels: self.exec_constraint_labels,
      force_execution_platform: self.force_execution_platform,
      debug_target: self.debug_target,
    })
  }
}
