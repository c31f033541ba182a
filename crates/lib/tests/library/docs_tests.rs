//! Tests for documentation assembled from the built-in registry.

use kiln_lib::eval::builtin_registry;

#[test]
fn cc_common_methods_are_collated() {
  let registry = builtin_registry().unwrap();
  let doc = registry.get("cc_common").unwrap().doc();
  let names: Vec<String> = doc.list_methods().into_iter().map(|m| m.name()).collect();
  assert_eq!(
    names,
    vec!["create_compilation_outputs", "link", "merge_compilation_outputs"]
  );
}

#[test]
fn cc_common_source_path() {
  let registry = builtin_registry().unwrap();
  let doc = registry.get("cc_common").unwrap().doc();
  assert_eq!(
    doc.source_file_path(),
    "src/main/java/com/google/devtools/build/lib/starlarkbuildapi/cpp/BazelCcModuleApi.java"
  );
  assert_eq!(doc.title(), "cc_common");
  assert!(doc.raw_doc().starts_with("Utilities for C++"));
}

#[test]
fn link_signature_hides_undocumented_parameters() {
  let registry = builtin_registry().unwrap();
  let doc = registry.get("cc_common").unwrap().doc();
  let link = doc.method("link").unwrap().descriptor();
  let signature = link.signature();
  assert!(signature.starts_with("link(actions, feature_configuration, cc_toolchain, compilation_outputs=None"));
  assert!(signature.contains("additional_outputs=unbound"));
  assert!(!signature.contains("pdb_file"));
}
