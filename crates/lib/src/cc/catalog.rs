//! Descriptors for the `cc_common` module.

use crate::dsl::{ElementType, HandleKind, Literal, ModuleDefinition, OperationDescriptor, ParamDescriptor, ReturnKind, TypeTag};

pub const MODULE_NAME: &str = "cc_common";
pub const MODULE_TITLE: &str = "cc_common";
pub const MODULE_DOC: &str = "Utilities for C++ compilation, linking, and command line generation.";
pub const BACKING_TYPE: &str = "com.google.devtools.build.lib.starlarkbuildapi.cpp.BazelCcModuleApi";

pub const LINK: &str = "link";
pub const CREATE_COMPILATION_OUTPUTS: &str = "create_compilation_outputs";
pub const MERGE_COMPILATION_OUTPUTS: &str = "merge_compilation_outputs";

pub const LINK_TARGET: &str = "CcModule::link";
pub const CREATE_COMPILATION_OUTPUTS_TARGET: &str = "CcModule::create_compilation_outputs";
pub const MERGE_COMPILATION_OUTPUTS_TARGET: &str = "CcModule::merge_compilation_outputs";

const ACTIONS: TypeTag = TypeTag::Handle(HandleKind::Actions);
const FEATURE_CONFIGURATION: TypeTag = TypeTag::Handle(HandleKind::FeatureConfiguration);
const CC_TOOLCHAIN: TypeTag = TypeTag::Handle(HandleKind::CcToolchain);
const COMPILATION_OUTPUTS: TypeTag = TypeTag::Handle(HandleKind::CompilationOutputs);
const LTO_COMPILATION_CONTEXT: TypeTag = TypeTag::Handle(HandleKind::LtoCompilationContext);
const STRINGS: TypeTag = TypeTag::Sequence(Some(ElementType::String));
const LINKING_CONTEXTS: TypeTag = TypeTag::Sequence(Some(ElementType::Handle(HandleKind::LinkingContext)));

fn internal_bool(name: &str) -> ParamDescriptor {
  ParamDescriptor::named(name, [TypeTag::Bool]).unbound().undocumented()
}

/// `cc_common.link`: link an executable or dynamic library.
pub fn link() -> OperationDescriptor {
  OperationDescriptor::new(LINK, LINK_TARGET)
    .doc("Should be used for C++ transitive linking.")
    .param(ParamDescriptor::named("actions", [ACTIONS]).doc("<code>actions</code> object."))
    .param(
      ParamDescriptor::named("feature_configuration", [FEATURE_CONFIGURATION])
        .doc("<code>feature_configuration</code> to be queried."),
    )
    .param(ParamDescriptor::named("cc_toolchain", [CC_TOOLCHAIN]).doc("<code>CcToolchainInfo</code> provider to be used."))
    .param(
      ParamDescriptor::named("compilation_outputs", [COMPILATION_OUTPUTS, TypeTag::None])
        .doc("Compilation outputs containing object files to link.")
        .default(Literal::None),
    )
    .param(
      ParamDescriptor::named("user_link_flags", [STRINGS])
        .doc("Additional list of linkopts.")
        .default(Literal::EmptyList),
    )
    .param(
      ParamDescriptor::named("linking_contexts", [LINKING_CONTEXTS])
        .doc("Libraries from dependencies. These libraries will be linked into the output artifact of the link() call, be it a binary or a library.")
        .default(Literal::EmptyList),
    )
    .param(ParamDescriptor::named("name", [TypeTag::String]).doc(
      "This is used for naming the output artifacts of actions created by this method.",
    ))
    .param(
      ParamDescriptor::named("language", [TypeTag::String])
        .doc("Only C++ supported for now. Do not use this parameter.")
        .default(Literal::Str("c++".to_string())),
    )
    .param(
      ParamDescriptor::named("output_type", [TypeTag::String])
        .doc("Can be either 'executable' or 'dynamic_library'.")
        .default(Literal::Str("executable".to_string())),
    )
    .param(
      ParamDescriptor::named("link_deps_statically", [TypeTag::Bool])
        .doc("True to link dependencies statically, False dynamically.")
        .default(Literal::Bool(true)),
    )
    .param(
      ParamDescriptor::named("stamp", [TypeTag::Int])
        .doc(
          "Whether to include build information in the linked executable, if output_type is 'executable'. \
           If 1, build information is always included. If 0 (the default), build information is always excluded. \
           If -1, uses the default behavior, which may be overridden by the --[no]stamp flag. \
           This should be unset (or set to 0) when generating the executable output for test rules.",
        )
        .default(Literal::Int(0)),
    )
    .param(
      ParamDescriptor::named("additional_inputs", [TypeTag::Sequence(None), TypeTag::Depset(None)])
        .doc("For additional inputs to the linking action, e.g.: linking scripts.")
        .default(Literal::EmptyList),
    )
    .param(
      ParamDescriptor::named("grep_includes", [TypeTag::File, TypeTag::None])
        .doc("Grep includes tool used by the link action.")
        .default(Literal::None),
    )
    .param(
      ParamDescriptor::named("link_artifact_name_suffix", [TypeTag::String])
        .unbound()
        .undocumented(),
    )
    .param(internal_bool("never_link"))
    .param(internal_bool("always_link"))
    .param(internal_bool("test_only_target"))
    .param(ParamDescriptor::named("variables_extension", [TypeTag::Mapping]).unbound().undocumented())
    .param(internal_bool("native_deps"))
    .param(internal_bool("whole_archive"))
    .param(
      ParamDescriptor::named("additional_linkstamp_defines", [STRINGS])
        .unbound()
        .undocumented(),
    )
    .param(internal_bool("only_for_dynamic_libs"))
    .param(
      ParamDescriptor::named("main_output", [TypeTag::File, TypeTag::None])
        .unbound()
        .undocumented(),
    )
    .param(
      ParamDescriptor::named("additional_outputs", [TypeTag::Sequence(None)])
        .doc("For additional outputs to the linking action, e.g.: map files.")
        .unbound(),
    )
    .param(internal_bool("use_test_only_flags"))
    .param(ParamDescriptor::named("pdb_file", [TypeTag::Any]).unbound().undocumented())
    .param(ParamDescriptor::named("win_def_file", [TypeTag::Any]).unbound().undocumented())
    .returns(ReturnKind::new("linking-outputs"))
    .uses_evaluation_context()
}

/// `cc_common.create_compilation_outputs`: wrap object files for linking.
pub fn create_compilation_outputs() -> OperationDescriptor {
  let objects = [TypeTag::Depset(None), TypeTag::None];
  OperationDescriptor::new(CREATE_COMPILATION_OUTPUTS, CREATE_COMPILATION_OUTPUTS_TARGET)
    .doc("Create compilation outputs object.")
    .param(
      ParamDescriptor::named("objects", objects)
        .doc("List of object files.")
        .default(Literal::None),
    )
    .param(
      ParamDescriptor::named("pic_objects", objects)
        .doc("List of pic object files.")
        .default(Literal::None),
    )
    .param(
      ParamDescriptor::named("lto_compilation_context", [LTO_COMPILATION_CONTEXT, TypeTag::None])
        .unbound()
        .undocumented(),
    )
    .returns(ReturnKind::new("compilation-outputs"))
    .uses_evaluation_context()
}

/// `cc_common.merge_compilation_outputs`: concatenate several compilation outputs.
pub fn merge_compilation_outputs() -> OperationDescriptor {
  OperationDescriptor::new(MERGE_COMPILATION_OUTPUTS, MERGE_COMPILATION_OUTPUTS_TARGET)
    .doc("Merge compilation outputs.")
    .param(
      ParamDescriptor::named("compilation_outputs", [TypeTag::Sequence(None)])
        .default(Literal::EmptyList),
    )
    .returns(ReturnKind::new("compilation-outputs"))
}

/// The full `cc_common` module definition.
pub fn definition() -> ModuleDefinition {
  ModuleDefinition {
    name: MODULE_NAME.to_string(),
    title: MODULE_TITLE.to_string(),
    doc: MODULE_DOC.to_string(),
    top_level: false,
    backing_type: BACKING_TYPE.to_string(),
    operations: vec![link(), create_compilation_outputs(), merge_compilation_outputs()],
    constructor: None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dsl::DefaultValue;

  #[test]
  fn link_parameters_are_keyword_only() {
    let link = link();
    assert_eq!(link.parameters.len(), 27);
    assert!(link.parameters.iter().all(|p| p.named && !p.positional));
  }

  #[test]
  fn link_documented_parameters() {
    let link = link();
    let documented: Vec<&str> = link.documented_parameters().map(|p| p.name.as_str()).collect();
    assert_eq!(
      documented,
      vec![
        "actions",
        "feature_configuration",
        "cc_toolchain",
        "compilation_outputs",
        "user_link_flags",
        "linking_contexts",
        "name",
        "language",
        "output_type",
        "link_deps_statically",
        "stamp",
        "additional_inputs",
        "grep_includes",
        "additional_outputs",
      ]
    );
  }

  #[test]
  fn undocumented_link_parameters_are_unbound() {
    for p in link().parameters.iter().filter(|p| !p.documented) {
      assert_eq!(p.default, DefaultValue::Unbound, "{}", p.name);
    }
    assert_eq!(link().parameter("additional_outputs").unwrap().default, DefaultValue::Unbound);
  }

  #[test]
  fn link_defaults() {
    let link = link();
    let default = |name: &str| link.parameter(name).unwrap().default.to_string();
    assert_eq!(default("language"), "'c++'");
    assert_eq!(default("output_type"), "'executable'");
    assert_eq!(default("link_deps_statically"), "True");
    assert_eq!(default("stamp"), "0");
    assert_eq!(default("compilation_outputs"), "None");
    assert_eq!(default("user_link_flags"), "[]");
    assert!(link.parameter("name").unwrap().default.is_required());
    assert!(link.uses_evaluation_context);
  }

  #[test]
  fn merge_does_not_use_evaluation_context() {
    assert!(!merge_compilation_outputs().uses_evaluation_context);
    assert!(create_compilation_outputs().uses_evaluation_context);
  }
}
