use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use super::api::{CcModuleApi, CompilationOutputsArgs, LinkArgs};
use super::catalog::{CREATE_COMPILATION_OUTPUTS, LINK, MERGE_COMPILATION_OUTPUTS, MODULE_NAME};
use super::manifest::LinkRequest;
use super::types::{CompilationOutputs, LinkingContext, LinkingOutputs, OutputType, Stamp};
use crate::dsl::{Artifact, DslError, DslValue, EvalThread};

fn qualified(op: &str) -> String {
  format!("{}.{}", MODULE_NAME, op)
}

/// Collect the files in `items`, failing on anything else.
fn artifacts(op: &str, param: &str, items: &[DslValue]) -> Result<Vec<Artifact>, DslError> {
  items
    .iter()
    .map(|item| {
      item.as_file().cloned().ok_or_else(|| {
        DslError::eval_error(
          &qualified(op),
          format!("'{}' must contain only files, got {}", param, item.type_name()),
        )
      })
    })
    .collect()
}

/// Artifacts in first-seen order without repeats.
#[derive(Debug, Default)]
struct UniqueArtifacts {
  items: Vec<Artifact>,
  seen: HashSet<Artifact>,
}

impl UniqueArtifacts {
  fn extend(&mut self, items: &[Artifact]) {
    for item in items {
      if self.seen.insert(item.clone()) {
        self.items.push(item.clone());
      }
    }
  }

  fn into_vec(self) -> Vec<Artifact> {
    self.items
  }
}

/// A `cc_common` that records link requests instead of building anything.
///
/// Each successful `link` adds a [`LinkRequest`] to the evaluation's manifest.
/// The internal `variables_extension`, `pdb_file` and `win_def_file`
/// arguments are accepted but not recorded.
#[derive(Debug, Default, Clone)]
pub struct DeclaringCcModule;

impl DeclaringCcModule {
  pub fn new() -> Self {
    Self
  }

  fn output_artifact(args: &LinkArgs, output_type: OutputType) -> Artifact {
    if let Some(main_output) = &args.main_output {
      return main_output.clone();
    }
    let stem = format!(
      "{}{}",
      args.name,
      args.link_artifact_name_suffix.as_deref().unwrap_or_default()
    );
    let file_name = match output_type {
      OutputType::Executable => format!("{}{}", stem, args.cc_toolchain.executable_extension),
      OutputType::DynamicLibrary => format!("lib{}.{}", stem, args.cc_toolchain.dynamic_library_extension),
    };
    args.actions.declare_file(&file_name)
  }
}

impl CcModuleApi for DeclaringCcModule {
  fn link(&self, args: LinkArgs, thread: &EvalThread) -> Result<LinkingOutputs, DslError> {
    let op = qualified(LINK);
    if args.language != "c++" {
      return Err(DslError::eval_error(
        &op,
        format!("language '{}' is not supported, only 'c++'", args.language),
      ));
    }
    let output_type: OutputType = args.output_type.parse().map_err(|e: String| DslError::eval_error(&op, e))?;
    let stamp = Stamp::try_from(args.stamp).map_err(|e| DslError::eval_error(&op, e))?;

    let output = Self::output_artifact(&args, output_type);
    let (objects, pic_objects) = match &args.compilation_outputs {
      Some(outputs) => (outputs.objects.clone(), outputs.pic_objects.clone()),
      None => (Vec::new(), Vec::new()),
    };

    let mut libraries = UniqueArtifacts::default();
    let mut user_link_flags = args.user_link_flags.clone();
    for context in &args.linking_contexts {
      libraries.extend(&context.libraries);
      user_link_flags.extend(context.user_link_flags.iter().cloned());
    }

    let internal_flags: BTreeMap<String, bool> = [
      ("never_link", args.never_link),
      ("always_link", args.always_link),
      ("test_only_target", args.test_only_target),
      ("native_deps", args.native_deps),
      ("whole_archive", args.whole_archive),
      ("only_for_dynamic_libs", args.only_for_dynamic_libs),
      ("use_test_only_flags", args.use_test_only_flags),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
    .collect();

    let request = LinkRequest {
      name: args.name.clone(),
      label: args.actions.label().to_string(),
      output: output.clone(),
      output_type,
      stamp,
      toolchain: args.cc_toolchain.identifier.clone(),
      features: args.feature_configuration.features().map(str::to_string).collect(),
      objects,
      pic_objects,
      libraries: libraries.into_vec(),
      user_link_flags,
      link_deps_statically: args.link_deps_statically,
      additional_inputs: artifacts(LINK, "additional_inputs", &args.additional_inputs)?,
      grep_includes: args.grep_includes.clone(),
      additional_outputs: artifacts(LINK, "additional_outputs", args.additional_outputs.as_deref().unwrap_or_default())?,
      linkstamp_defines: args.additional_linkstamp_defines.clone().unwrap_or_default(),
      internal_flags,
    };

    if let Err(existing) = thread.manifest().borrow_mut().add_link(request) {
      return Err(DslError::eval_error(
        &op,
        format!("output '{}' is already produced by link '{}'", output.path(), existing.name),
      ));
    }
    debug!(output = %output.path(), %output_type, thread = %thread.name(), "link declared");

    Ok(match output_type {
      OutputType::Executable => LinkingOutputs {
        executable: Some(output),
        ..Default::default()
      },
      OutputType::DynamicLibrary => LinkingOutputs {
        library_to_link: Some(output.clone()),
        linking_context: Some(LinkingContext {
          libraries: vec![output],
          user_link_flags: Vec::new(),
        }),
        ..Default::default()
      },
    })
  }

  fn create_compilation_outputs(
    &self,
    args: CompilationOutputsArgs,
    _thread: &EvalThread,
  ) -> Result<CompilationOutputs, DslError> {
    let objects = args.objects.unwrap_or_default();
    let pic_objects = args.pic_objects.unwrap_or_default();
    Ok(CompilationOutputs {
      objects: artifacts(CREATE_COMPILATION_OUTPUTS, "objects", &objects)?,
      pic_objects: artifacts(CREATE_COMPILATION_OUTPUTS, "pic_objects", &pic_objects)?,
      lto_compilation_context: args.lto_compilation_context,
    })
  }

  fn merge_compilation_outputs(&self, compilation_outputs: Vec<DslValue>) -> Result<CompilationOutputs, DslError> {
    let mut objects = UniqueArtifacts::default();
    let mut pic_objects = UniqueArtifacts::default();
    let mut lto_compilation_context = None;
    for value in &compilation_outputs {
      let outputs = value.as_handle::<CompilationOutputs>().ok_or_else(|| {
        DslError::eval_error(
          &qualified(MERGE_COMPILATION_OUTPUTS),
          format!("expected CompilationOutputs, got {}", value.type_name()),
        )
      })?;
      objects.extend(&outputs.objects);
      pic_objects.extend(&outputs.pic_objects);
      if lto_compilation_context.is_none() {
        lto_compilation_context = outputs.lto_compilation_context.clone();
      }
    }
    Ok(CompilationOutputs {
      objects: objects.into_vec(),
      pic_objects: pic_objects.into_vec(),
      lto_compilation_context,
    })
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::Rc;

  use super::*;
  use crate::cc::types::{ActionFactory, CcToolchain, FeatureConfiguration};
  use crate::dsl::{Arg, Depset, Interrupt};
  use crate::manifest::Manifest;

  fn thread() -> EvalThread {
    EvalThread::new("test", Interrupt::new(), Rc::new(RefCell::new(Manifest::default())))
  }

  fn args(name: &str) -> LinkArgs {
    LinkArgs {
      actions: ActionFactory::new("//app:main"),
      feature_configuration: FeatureConfiguration::new(["pic".to_string()]),
      cc_toolchain: CcToolchain::default(),
      compilation_outputs: None,
      user_link_flags: Vec::new(),
      linking_contexts: Vec::new(),
      name: name.to_string(),
      language: "c++".to_string(),
      output_type: "executable".to_string(),
      link_deps_statically: true,
      stamp: 0,
      additional_inputs: Vec::new(),
      grep_includes: None,
      link_artifact_name_suffix: None,
      never_link: None,
      always_link: None,
      test_only_target: None,
      variables_extension: None,
      native_deps: None,
      whole_archive: None,
      additional_linkstamp_defines: None,
      only_for_dynamic_libs: None,
      main_output: None,
      additional_outputs: None,
      use_test_only_flags: None,
      pdb_file: Arg::Unbound,
      win_def_file: Arg::Unbound,
    }
  }

  fn eval_message(result: Result<LinkingOutputs, DslError>) -> String {
    match result {
      Err(DslError::Eval { message, .. }) => message,
      other => panic!("expected eval error, got {:?}", other),
    }
  }

  mod link {
    use super::*;

    #[test]
    fn executable_named_after_target() {
      let thread = thread();
      let outputs = DeclaringCcModule.link(args("main"), &thread).unwrap();
      assert_eq!(outputs.executable.unwrap().path(), "app/main");

      let manifest = thread.manifest().borrow();
      let request = &manifest.links["app/main"];
      assert_eq!(request.label, "//app:main");
      assert_eq!(request.features, vec!["pic"]);
      assert_eq!(request.stamp, Stamp::Never);
    }

    #[test]
    fn grep_includes_is_recorded() {
      let thread = thread();
      let mut a = args("main");
      a.grep_includes = Some(Artifact::new("tools/grep-includes"));
      DeclaringCcModule.link(a, &thread).unwrap();
      DeclaringCcModule.link(args("other"), &thread).unwrap();

      let manifest = thread.manifest().borrow();
      assert_eq!(
        manifest.links["app/main"].grep_includes,
        Some(Artifact::new("tools/grep-includes"))
      );
      assert_eq!(manifest.links["app/other"].grep_includes, None);
    }

    #[test]
    fn dynamic_library_uses_toolchain_extension_and_suffix() {
      let mut a = args("util");
      a.output_type = "dynamic_library".to_string();
      a.link_artifact_name_suffix = Some("_v2".to_string());
      a.cc_toolchain.dynamic_library_extension = "dylib".to_string();

      let outputs = DeclaringCcModule.link(a, &thread()).unwrap();
      assert_eq!(outputs.library_to_link.clone().unwrap().path(), "app/libutil_v2.dylib");
      assert_eq!(outputs.linking_context.unwrap().libraries, vec![Artifact::new("app/libutil_v2.dylib")]);
      assert!(outputs.executable.is_none());
    }

    #[test]
    fn main_output_wins() {
      let mut a = args("main");
      a.main_output = Some(Artifact::new("out/custom"));
      let outputs = DeclaringCcModule.link(a, &thread()).unwrap();
      assert_eq!(outputs.executable.unwrap().path(), "out/custom");
    }

    #[test]
    fn rejects_other_languages() {
      let mut a = args("main");
      a.language = "c".to_string();
      assert!(eval_message(DeclaringCcModule.link(a, &thread())).contains("'c'"));
    }

    #[test]
    fn rejects_unknown_output_type_and_stamp() {
      let mut a = args("main");
      a.output_type = "archive".to_string();
      assert!(eval_message(DeclaringCcModule.link(a, &thread())).contains("output_type"));

      let mut a = args("main");
      a.stamp = 7;
      assert!(eval_message(DeclaringCcModule.link(a, &thread())).contains("stamp"));
    }

    #[test]
    fn duplicate_output_rejected() {
      let thread = thread();
      DeclaringCcModule.link(args("main"), &thread).unwrap();
      let message = eval_message(DeclaringCcModule.link(args("main"), &thread));
      assert!(message.contains("already produced"));
      assert_eq!(thread.manifest().borrow().links.len(), 1);
    }

    #[test]
    fn linking_contexts_contribute_libraries_and_flags() {
      let mut a = args("main");
      a.user_link_flags = vec!["-lm".to_string()];
      a.linking_contexts = vec![
        LinkingContext {
          libraries: vec![Artifact::new("lib/liba.so")],
          user_link_flags: vec!["-pthread".to_string()],
        },
        LinkingContext {
          libraries: vec![Artifact::new("lib/liba.so")],
          user_link_flags: Vec::new(),
        },
      ];
      a.whole_archive = Some(true);
      let thread = thread();
      DeclaringCcModule.link(a, &thread).unwrap();

      let manifest = thread.manifest().borrow();
      let request = &manifest.links["app/main"];
      assert_eq!(request.libraries, vec![Artifact::new("lib/liba.so")]);
      assert_eq!(request.user_link_flags, vec!["-lm", "-pthread"]);
      assert_eq!(request.internal_flags.get("whole_archive"), Some(&true));
      assert!(!request.internal_flags.contains_key("never_link"));
    }

    #[test]
    fn additional_inputs_must_be_files() {
      let mut a = args("main");
      a.additional_inputs = vec![DslValue::from("script.ld")];
      assert!(eval_message(DeclaringCcModule.link(a, &thread())).contains("additional_inputs"));
    }
  }

  mod compilation_outputs {
    use super::*;

    fn files(paths: &[&str]) -> Vec<DslValue> {
      paths.iter().map(|p| DslValue::File(Artifact::new(*p))).collect()
    }

    #[test]
    fn create_from_depsets() {
      let args = CompilationOutputsArgs {
        objects: Some(Depset::new(files(&["a.o", "b.o"])).to_list()),
        pic_objects: None,
        lto_compilation_context: None,
      };
      let outputs = DeclaringCcModule.create_compilation_outputs(args, &thread()).unwrap();
      assert_eq!(outputs.objects, vec![Artifact::new("a.o"), Artifact::new("b.o")]);
      assert!(outputs.pic_objects.is_empty());
    }

    #[test]
    fn create_rejects_non_files() {
      let args = CompilationOutputsArgs {
        objects: Some(vec![DslValue::Int(1)]),
        pic_objects: None,
        lto_compilation_context: None,
      };
      let err = DeclaringCcModule.create_compilation_outputs(args, &thread()).unwrap_err();
      assert!(err.is_eval_error());
    }

    #[test]
    fn merge_concatenates_without_duplicates() {
      let first = CompilationOutputs {
        objects: vec![Artifact::new("a.o"), Artifact::new("b.o")],
        ..Default::default()
      };
      let second = CompilationOutputs {
        objects: vec![Artifact::new("b.o"), Artifact::new("c.o")],
        pic_objects: vec![Artifact::new("c.pic.o")],
        ..Default::default()
      };
      let merged = DeclaringCcModule
        .merge_compilation_outputs(vec![DslValue::handle(first), DslValue::handle(second)])
        .unwrap();
      assert_eq!(
        merged.objects,
        vec![Artifact::new("a.o"), Artifact::new("b.o"), Artifact::new("c.o")]
      );
      assert_eq!(merged.pic_objects, vec![Artifact::new("c.pic.o")]);
    }

    #[test]
    fn merge_many_outputs_keeps_first_seen_order() {
      let outputs: Vec<DslValue> = (0..200)
        .map(|i| {
          DslValue::handle(CompilationOutputs {
            objects: (i..i + 100).map(|j| Artifact::new(format!("{}.o", j))).collect(),
            ..Default::default()
          })
        })
        .collect();
      let merged = DeclaringCcModule.merge_compilation_outputs(outputs).unwrap();
      let expected: Vec<Artifact> = (0..299).map(|j| Artifact::new(format!("{}.o", j))).collect();
      assert_eq!(merged.objects, expected);
    }

    #[test]
    fn merge_empty_is_empty() {
      assert_eq!(
        DeclaringCcModule.merge_compilation_outputs(Vec::new()).unwrap(),
        CompilationOutputs::default()
      );
    }

    #[test]
    fn merge_rejects_other_values() {
      let err = DeclaringCcModule
        .merge_compilation_outputs(vec![DslValue::from("a.o")])
        .unwrap_err();
      assert!(err.is_eval_error());
    }
  }
}
