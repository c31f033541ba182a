//! The `cc_common` collaborator interface.
//!
//! [`CcModuleApi`] is what a C++ rules implementation provides. Arguments
//! arrive already bound and type-checked, converted into typed structs.
//! [`CcCommonModule`] adapts any implementation into a [`NativeModule`].

use std::collections::BTreeMap;

use super::catalog::{self, CREATE_COMPILATION_OUTPUTS_TARGET, LINK_TARGET, MERGE_COMPILATION_OUTPUTS_TARGET};
use super::types::{
  ActionFactory, CcToolchain, CompilationOutputs, FeatureConfiguration, LinkingContext, LinkingOutputs,
  LtoCompilationContext,
};
use crate::dsl::{
  Arg, Artifact, BoundArgs, DslError, DslValue, EvalThread, ModuleDefinition, NativeHandle, NativeModule,
  OperationDescriptor,
};

/// Typed arguments of `cc_common.link`.
///
/// Optional parameters without a default are `None` when the caller omitted
/// them. `pdb_file` and `win_def_file` accept anything, so they keep the raw
/// bound argument.
#[derive(Debug, Clone)]
pub struct LinkArgs {
  pub actions: ActionFactory,
  pub feature_configuration: FeatureConfiguration,
  pub cc_toolchain: CcToolchain,
  pub compilation_outputs: Option<CompilationOutputs>,
  pub user_link_flags: Vec<String>,
  pub linking_contexts: Vec<LinkingContext>,
  pub name: String,
  pub language: String,
  pub output_type: String,
  pub link_deps_statically: bool,
  pub stamp: i64,
  pub additional_inputs: Vec<DslValue>,
  pub grep_includes: Option<Artifact>,
  pub link_artifact_name_suffix: Option<String>,
  pub never_link: Option<bool>,
  pub always_link: Option<bool>,
  pub test_only_target: Option<bool>,
  pub variables_extension: Option<BTreeMap<String, DslValue>>,
  pub native_deps: Option<bool>,
  pub whole_archive: Option<bool>,
  pub additional_linkstamp_defines: Option<Vec<String>>,
  pub only_for_dynamic_libs: Option<bool>,
  pub main_output: Option<Artifact>,
  pub additional_outputs: Option<Vec<DslValue>>,
  pub use_test_only_flags: Option<bool>,
  pub pdb_file: Arg,
  pub win_def_file: Arg,
}

/// Typed arguments of `cc_common.create_compilation_outputs`.
#[derive(Debug, Clone)]
pub struct CompilationOutputsArgs {
  pub objects: Option<Vec<DslValue>>,
  pub pic_objects: Option<Vec<DslValue>>,
  /// Unbound and explicit `None` both read as `None`.
  pub lto_compilation_context: Option<LtoCompilationContext>,
}

/// Operations of the `cc_common` module.
pub trait CcModuleApi: Send + Sync {
  fn link(&self, args: LinkArgs, thread: &EvalThread) -> Result<LinkingOutputs, DslError>;

  fn create_compilation_outputs(
    &self,
    args: CompilationOutputsArgs,
    thread: &EvalThread,
  ) -> Result<CompilationOutputs, DslError>;

  /// Elements are whatever the caller put in the list.
  fn merge_compilation_outputs(&self, compilation_outputs: Vec<DslValue>) -> Result<CompilationOutputs, DslError>;
}

/// Exposes a [`CcModuleApi`] as the `cc_common` native module.
pub struct CcCommonModule<A> {
  api: A,
}

impl<A: CcModuleApi> CcCommonModule<A> {
  pub fn new(api: A) -> Self {
    Self { api }
  }
}

impl<A: CcModuleApi> NativeModule for CcCommonModule<A> {
  fn definition(&self) -> ModuleDefinition {
    catalog::definition()
  }

  fn call(&self, op: &OperationDescriptor, args: &BoundArgs, thread: Option<&EvalThread>) -> Result<DslValue, DslError> {
    let qualified = format!("{}.{}", catalog::MODULE_NAME, op.name);
    let read = Reader {
      operation: &qualified,
      args,
    };
    let thread = || thread.ok_or_else(|| DslError::eval_error(&qualified, "requires an evaluation thread"));

    match op.target.as_str() {
      LINK_TARGET => {
        let outputs = self.api.link(read.link_args()?, thread()?)?;
        Ok(DslValue::handle(outputs))
      }
      CREATE_COMPILATION_OUTPUTS_TARGET => {
        let args = CompilationOutputsArgs {
          objects: read.optional_list("objects")?,
          pic_objects: read.optional_list("pic_objects")?,
          lto_compilation_context: read.optional_handle::<LtoCompilationContext>("lto_compilation_context")?,
        };
        let outputs = self.api.create_compilation_outputs(args, thread()?)?;
        Ok(DslValue::handle(outputs))
      }
      MERGE_COMPILATION_OUTPUTS_TARGET => {
        let outputs = self.api.merge_compilation_outputs(read.list("compilation_outputs")?)?;
        Ok(DslValue::handle(outputs))
      }
      other => Err(DslError::eval_error(&qualified, format!("no implementation for '{}'", other))),
    }
  }
}

/// Typed access to bound arguments. Values were type-checked while binding,
/// so a mismatch here means the catalog and the reader disagree.
struct Reader<'a> {
  operation: &'a str,
  args: &'a BoundArgs,
}

impl Reader<'_> {
  fn mismatch(&self, name: &str, want: &str) -> DslError {
    DslError::type_error(self.operation, format!("parameter '{}' is not a {}", name, want))
  }

  fn missing(&self, name: &str) -> DslError {
    DslError::type_error(self.operation, format!("missing mandatory parameter '{}'", name))
  }

  fn required(&self, name: &str) -> Result<&DslValue, DslError> {
    self.args.get(name).value().ok_or_else(|| self.missing(name))
  }

  fn handle<T: NativeHandle + Clone>(&self, name: &str) -> Result<T, DslError> {
    self
      .required(name)?
      .as_handle::<T>()
      .cloned()
      .ok_or_else(|| self.mismatch(name, "handle of the expected kind"))
  }

  fn optional_handle<T: NativeHandle + Clone>(&self, name: &str) -> Result<Option<T>, DslError> {
    match self.args.get(name).present() {
      Some(value) => value
        .as_handle::<T>()
        .cloned()
        .map(Some)
        .ok_or_else(|| self.mismatch(name, "handle of the expected kind")),
      None => Ok(None),
    }
  }

  fn string(&self, name: &str) -> Result<String, DslError> {
    self
      .required(name)?
      .as_str()
      .map(str::to_string)
      .ok_or_else(|| self.mismatch(name, "string"))
  }

  fn optional_string(&self, name: &str) -> Result<Option<String>, DslError> {
    match self.args.get(name).present() {
      Some(value) => value.as_str().map(|s| Some(s.to_string())).ok_or_else(|| self.mismatch(name, "string")),
      None => Ok(None),
    }
  }

  fn bool(&self, name: &str) -> Result<bool, DslError> {
    self.required(name)?.as_bool().ok_or_else(|| self.mismatch(name, "bool"))
  }

  fn optional_bool(&self, name: &str) -> Result<Option<bool>, DslError> {
    match self.args.get(name).present() {
      Some(value) => value.as_bool().map(Some).ok_or_else(|| self.mismatch(name, "bool")),
      None => Ok(None),
    }
  }

  fn int(&self, name: &str) -> Result<i64, DslError> {
    self.required(name)?.as_int().ok_or_else(|| self.mismatch(name, "int"))
  }

  fn optional_file(&self, name: &str) -> Result<Option<Artifact>, DslError> {
    match self.args.get(name).present() {
      Some(value) => value.as_file().cloned().map(Some).ok_or_else(|| self.mismatch(name, "File")),
      None => Ok(None),
    }
  }

  /// Elements of a sequence or depset.
  fn list(&self, name: &str) -> Result<Vec<DslValue>, DslError> {
    self.optional_list(name)?.ok_or_else(|| self.missing(name))
  }

  fn optional_list(&self, name: &str) -> Result<Option<Vec<DslValue>>, DslError> {
    match self.args.get(name).present() {
      Some(DslValue::Sequence(items)) => Ok(Some(items.clone())),
      Some(DslValue::Depset(depset)) => Ok(Some(depset.to_list())),
      Some(_) => Err(self.mismatch(name, "sequence or depset")),
      None => Ok(None),
    }
  }

  fn strings(&self, name: &str) -> Result<Vec<String>, DslError> {
    self
      .list(name)?
      .iter()
      .map(|v| v.as_str().map(str::to_string).ok_or_else(|| self.mismatch(name, "sequence of string")))
      .collect()
  }

  fn optional_strings(&self, name: &str) -> Result<Option<Vec<String>>, DslError> {
    match self.args.get(name).present() {
      Some(_) => self.strings(name).map(Some),
      None => Ok(None),
    }
  }

  fn optional_mapping(&self, name: &str) -> Result<Option<BTreeMap<String, DslValue>>, DslError> {
    match self.args.get(name).present() {
      Some(DslValue::Mapping(map)) => Ok(Some(map.clone())),
      Some(DslValue::Sequence(items)) if items.is_empty() => Ok(Some(BTreeMap::new())),
      Some(_) => Err(self.mismatch(name, "dict")),
      None => Ok(None),
    }
  }

  fn link_args(&self) -> Result<LinkArgs, DslError> {
    let linking_contexts = self
      .list("linking_contexts")?
      .iter()
      .map(|v| {
        v.as_handle::<LinkingContext>()
          .cloned()
          .ok_or_else(|| self.mismatch("linking_contexts", "sequence of LinkingContext"))
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(LinkArgs {
      actions: self.handle("actions")?,
      feature_configuration: self.handle("feature_configuration")?,
      cc_toolchain: self.handle("cc_toolchain")?,
      compilation_outputs: self.optional_handle("compilation_outputs")?,
      user_link_flags: self.strings("user_link_flags")?,
      linking_contexts,
      name: self.string("name")?,
      language: self.string("language")?,
      output_type: self.string("output_type")?,
      link_deps_statically: self.bool("link_deps_statically")?,
      stamp: self.int("stamp")?,
      additional_inputs: self.list("additional_inputs")?,
      grep_includes: self.optional_file("grep_includes")?,
      link_artifact_name_suffix: self.optional_string("link_artifact_name_suffix")?,
      never_link: self.optional_bool("never_link")?,
      always_link: self.optional_bool("always_link")?,
      test_only_target: self.optional_bool("test_only_target")?,
      variables_extension: self.optional_mapping("variables_extension")?,
      native_deps: self.optional_bool("native_deps")?,
      whole_archive: self.optional_bool("whole_archive")?,
      additional_linkstamp_defines: self.optional_strings("additional_linkstamp_defines")?,
      only_for_dynamic_libs: self.optional_bool("only_for_dynamic_libs")?,
      main_output: self.optional_file("main_output")?,
      additional_outputs: self.optional_list("additional_outputs")?,
      use_test_only_flags: self.optional_bool("use_test_only_flags")?,
      pdb_file: self.args.get("pdb_file").clone(),
      win_def_file: self.args.get("win_def_file").clone(),
    })
  }
}
