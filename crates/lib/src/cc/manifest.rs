use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{OutputType, Stamp};
use crate::dsl::Artifact;

/// A link declared by `cc_common.link`, recorded for a downstream planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
  pub name: String,
  /// Label of the target that declared the link.
  pub label: String,
  pub output: Artifact,
  pub output_type: OutputType,
  pub stamp: Stamp,
  /// Identifier of the toolchain performing the link.
  pub toolchain: String,
  pub features: Vec<String>,
  pub objects: Vec<Artifact>,
  pub pic_objects: Vec<Artifact>,
  /// Libraries contributed by linking contexts, deduplicated.
  pub libraries: Vec<Artifact>,
  pub user_link_flags: Vec<String>,
  pub link_deps_statically: bool,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub additional_inputs: Vec<Artifact>,
  /// Helper binary the link action may invoke.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub grep_includes: Option<Artifact>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub additional_outputs: Vec<Artifact>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub linkstamp_defines: Vec<String>,
  /// Internal boolean options the caller set explicitly.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub internal_flags: BTreeMap<String, bool>,
}
