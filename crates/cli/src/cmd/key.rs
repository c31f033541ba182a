//! Implementation of the `kiln key` command.

use anyhow::{Context, Result};
use serde::Serialize;

use kiln_lib::key::{ConfigurationId, Label, ToolchainRequestKey, ToolchainTypeRequirement};

use crate::output::{OutputFormat, print_json, print_stat, print_success};

fn parse_labels(values: &[String]) -> Result<Vec<Label>> {
  values
    .iter()
    .map(|value| Label::new(value.as_str()).with_context(|| format!("Invalid label: {}", value)))
    .collect()
}

pub fn cmd_key(
  configuration: &str,
  toolchain_types: &[String],
  optional_toolchain_types: &[String],
  exec_constraints: &[String],
  force_platform: Option<&str>,
  debug_target: bool,
  output: OutputFormat,
) -> Result<()> {
  let mandatory = parse_labels(toolchain_types)?
    .into_iter()
    .map(ToolchainTypeRequirement::mandatory);
  let optional = parse_labels(optional_toolchain_types)?
    .into_iter()
    .map(ToolchainTypeRequirement::optional);
  let force_platform = force_platform
    .map(|value| Label::new(value).with_context(|| format!("Invalid platform label: {}", value)))
    .transpose()?;

  let key = ToolchainRequestKey::builder()
    .configuration(ConfigurationId::new(configuration))
    .toolchain_types(mandatory.chain(optional))
    .exec_constraint_labels(parse_labels(exec_constraints)?)
    .maybe_force_execution_platform(force_platform)
    .debug_target(debug_target)
    .build()
    .context("Failed to build toolchain request key")?;

  let fingerprint = key.fingerprint().context("Failed to compute key fingerprint")?;

  if output.is_json() {
    #[derive(Serialize)]
    struct KeyOutput<'a> {
      key: &'a ToolchainRequestKey,
      fingerprint: String,
    }

    print_json(&KeyOutput {
      key: &key,
      fingerprint: fingerprint.to_string(),
    })?;
  } else {
    print_success(&key.to_string());
    print_stat("Fingerprint", &fingerprint.to_string());
  }

  Ok(())
}
