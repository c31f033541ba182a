//! Implementation of the `kiln docs` command.
//!
//! Prints the reference documentation assembled for each built-in module:
//! methods in collated order with their documented parameters.

use anyhow::{Context, Result, bail};
use serde::Serialize;

use kiln_lib::doc::ModuleDoc;
use kiln_lib::dsl::ParamDescriptor;
use kiln_lib::eval::builtin_registry;

use crate::output::{OutputFormat, print_json, print_stat, symbols};

#[derive(Debug, Serialize)]
struct ModuleOutput<'a> {
  name: &'a str,
  title: &'a str,
  top_level: bool,
  source_file: String,
  doc: &'a str,
  methods: Vec<MethodOutput<'a>>,
}

#[derive(Debug, Serialize)]
struct MethodOutput<'a> {
  name: String,
  signature: String,
  doc: &'a str,
  returns: &'a str,
  parameters: Vec<&'a ParamDescriptor>,
}

impl<'a> ModuleOutput<'a> {
  fn new(doc: &'a ModuleDoc) -> Self {
    let methods = doc
      .list_methods()
      .into_iter()
      .map(|method| {
        let descriptor = method.descriptor();
        MethodOutput {
          name: method.name(),
          signature: descriptor.signature(),
          doc: &descriptor.doc,
          returns: descriptor.return_kind.as_str(),
          parameters: descriptor.documented_parameters().collect(),
        }
      })
      .collect();

    Self {
      name: doc.name(),
      title: doc.title(),
      top_level: doc.is_top_level(),
      source_file: doc.source_file_path(),
      doc: doc.raw_doc(),
      methods,
    }
  }
}

pub fn cmd_docs(module: Option<&str>, output: OutputFormat) -> Result<()> {
  let registry = builtin_registry().context("Failed to register built-in modules")?;

  let docs: Vec<&ModuleDoc> = match module {
    Some(name) => match registry.get(name) {
      Some(registered) => vec![registered.doc()],
      None => bail!("Unknown module: {}", name),
    },
    None => registry.docs().collect(),
  };

  let modules: Vec<ModuleOutput> = docs.into_iter().map(ModuleOutput::new).collect();

  if output.is_json() {
    print_json(&modules)?;
    return Ok(());
  }

  for module in &modules {
    println!("{}", module.title);
    print_stat("Source", &module.source_file);
    print_stat("Top level", &module.top_level.to_string());
    println!();
    for method in &module.methods {
      println!("{} {}", symbols::ARROW, method.signature);
      for param in &method.parameters {
        println!("    {}: {}", param.name, param.allowed_types_display());
      }
    }
    println!();
  }

  Ok(())
}
