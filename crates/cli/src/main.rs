mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{cmd_docs, cmd_eval, cmd_key};
use crate::output::{OutputFormat, print_error};

/// kiln - configuration layer for hermetic C++ builds
#[derive(Parser)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show reference documentation for built-in modules
  Docs {
    /// Only show this module
    #[arg(short, long)]
    module: Option<String>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Build a toolchain resolution key and print its fingerprint
  Key {
    /// Build configuration identifier
    #[arg(short, long, env = "KILN_CONFIGURATION")]
    configuration: String,

    /// Toolchain type that must resolve
    #[arg(long = "toolchain-type")]
    toolchain_types: Vec<String>,

    /// Toolchain type that may stay unresolved
    #[arg(long = "optional-toolchain-type")]
    optional_toolchain_types: Vec<String>,

    /// Constraint the execution platform must satisfy
    #[arg(long = "exec-constraint")]
    exec_constraints: Vec<String>,

    /// Use this execution platform instead of selecting one
    #[arg(long)]
    force_platform: Option<String>,

    /// Emit resolution debugging output for this request
    #[arg(long)]
    debug_target: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Evaluate a configuration and print the recorded link requests
  Eval {
    /// Path to the configuration file
    file: PathBuf,

    /// Label of the target being configured
    #[arg(short, long, env = "KILN_LABEL", default_value = "//:main")]
    label: String,

    /// Target CPU of the toolchain
    #[arg(long, env = "KILN_CPU")]
    cpu: Option<String>,

    /// Compiler of the toolchain
    #[arg(long, env = "KILN_COMPILER")]
    compiler: Option<String>,

    /// Enabled feature (repeatable)
    #[arg(short, long = "feature")]
    features: Vec<String>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn main() {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .without_time()
    .with_writer(std::io::stderr)
    .init();

  if let Err(err) = run(cli.command) {
    print_error(&format!("{:#}", err));
    std::process::exit(1);
  }
}

fn run(command: Commands) -> Result<()> {
  match command {
    Commands::Docs { module, output } => cmd_docs(module.as_deref(), output),
    Commands::Key {
      configuration,
      toolchain_types,
      optional_toolchain_types,
      exec_constraints,
      force_platform,
      debug_target,
      output,
    } => cmd_key(
      &configuration,
      &toolchain_types,
      &optional_toolchain_types,
      &exec_constraints,
      force_platform.as_deref(),
      debug_target,
      output,
    ),
    Commands::Eval {
      file,
      label,
      cpu,
      compiler,
      features,
      output,
    } => cmd_eval(&file, label, cpu, compiler, features, output),
  }
}
