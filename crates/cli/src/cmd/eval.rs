//! Implementation of the `kiln eval` command.
//!
//! Evaluates a Lua configuration with the built-in modules and prints the link
//! requests it recorded.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use kiln_lib::cc::CcToolchain;
use kiln_lib::eval::evaluate_config;
use kiln_lib::lua::runtime::RuntimeOptions;
use kiln_lib::manifest::Manifest;
use kiln_lib::util::hash::Hashable;

use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success, symbols};

pub fn cmd_eval(
  file: &Path,
  label: String,
  cpu: Option<String>,
  compiler: Option<String>,
  features: Vec<String>,
  output: OutputFormat,
) -> Result<()> {
  let mut toolchain = CcToolchain::default();
  if let Some(cpu) = cpu {
    toolchain.cpu = cpu;
  }
  if let Some(compiler) = compiler {
    toolchain.compiler = compiler;
  }
  let options = RuntimeOptions {
    label,
    toolchain,
    features,
    ..Default::default()
  };

  let manifest =
    evaluate_config(file, &options).with_context(|| format!("Failed to evaluate config: {}", file.display()))?;
  let hash = manifest.compute_hash().context("Failed to compute manifest hash")?;

  if output.is_json() {
    #[derive(Serialize)]
    struct EvalOutput<'a> {
      hash: String,
      manifest: &'a Manifest,
    }

    print_json(&EvalOutput {
      hash: hash.to_string(),
      manifest: &manifest,
    })?;
    return Ok(());
  }

  if manifest.is_empty() {
    print_info("No link requests recorded");
    return Ok(());
  }

  for (path, request) in &manifest.links {
    println!("{} {} ({}, {})", symbols::ARROW, path, request.output_type, request.label);
    print_stat("Objects", &request.objects.len().to_string());
    if !request.libraries.is_empty() {
      let libraries: Vec<&str> = request.libraries.iter().map(|lib| lib.path()).collect();
      print_stat("Libraries", &libraries.join(", "));
    }
    if !request.user_link_flags.is_empty() {
      print_stat("Flags", &request.user_link_flags.join(" "));
    }
  }
  print_success(&format!("Links: {}", manifest.links.len()));
  print_stat("Hash", &hash.to_string());

  Ok(())
}
