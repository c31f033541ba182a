//! Tests for cc_common.* called from Lua.

use kiln_lib::cc::{CcToolchain, OutputType, Stamp};
use kiln_lib::dsl::DslError;
use kiln_lib::lua::runtime::RuntimeOptions;
use mlua::prelude::*;

use super::common::{LINK_CONTEXT, create_test_runtime, create_test_runtime_with};

fn link_call(extra: &str) -> String {
  format!("return cc_common.link{{ {} {} }}", LINK_CONTEXT, extra)
}

fn dsl_error(err: &LuaError) -> DslError {
  DslError::from_lua(err)
    .cloned()
    .unwrap_or_else(|| panic!("expected a DslError in {}", err))
}

mod link {
  use super::*;

  #[test]
  fn missing_name_is_a_type_error() -> LuaResult<()> {
    let (lua, manifest) = create_test_runtime()?;
    let err = lua.load(link_call("")).exec().unwrap_err();
    match dsl_error(&err) {
      DslError::Type { operation, message } => {
        assert_eq!(operation, "cc_common.link");
        assert!(message.contains("'name'"), "{}", message);
      }
      other => panic!("expected type error, got {:?}", other),
    }
    assert!(manifest.borrow().is_empty());
    Ok(())
  }

  #[test]
  fn unsupported_language_passes_schema_and_fails_in_implementation() -> LuaResult<()> {
    let (lua, _) = create_test_runtime()?;
    let err = lua.load(link_call(r#"name = "app", language = "c","#)).exec().unwrap_err();
    assert!(dsl_error(&err).is_eval_error());
    Ok(())
  }

  #[test]
  fn wrong_type_is_a_type_error() -> LuaResult<()> {
    let (lua, _) = create_test_runtime()?;
    let err = lua.load(link_call(r#"name = "app", stamp = "yes","#)).exec().unwrap_err();
    assert!(dsl_error(&err).is_type_error());
    Ok(())
  }

  #[test]
  fn positional_arguments_are_rejected() -> LuaResult<()> {
    let (lua, _) = create_test_runtime()?;
    let err = lua.load(link_call(r#""app","#)).exec().unwrap_err();
    assert!(dsl_error(&err).is_type_error());
    Ok(())
  }

  #[test]
  fn executable_is_recorded() -> LuaResult<()> {
    let options = RuntimeOptions {
      label: "//server:bin".to_string(),
      toolchain: CcToolchain {
        identifier: "clang-linux".to_string(),
        ..Default::default()
      },
      features: vec!["static_link_cpp_runtimes".to_string()],
      ..Default::default()
    };
    let (lua, manifest) = create_test_runtime_with(&options)?;

    let path: String = lua
      .load(format!(
        r#"
          local objs = cc_common.create_compilation_outputs{{
            objects = depset{{ file("server/main.o"), file("server/util.o") }},
          }}
          local out = cc_common.link{{ {} name = "bin", compilation_outputs = objs, user_link_flags = {{ "-lm" }}, stamp = -1 }}
          return out.executable.path
        "#,
        LINK_CONTEXT
      ))
      .eval()?;
    assert_eq!(path, "server/bin");

    let m = manifest.borrow();
    let request = &m.links["server/bin"];
    assert_eq!(request.output_type, OutputType::Executable);
    assert_eq!(request.stamp, Stamp::Default);
    assert_eq!(request.toolchain, "clang-linux");
    assert_eq!(request.features, vec!["static_link_cpp_runtimes"]);
    assert_eq!(request.objects.len(), 2);
    assert_eq!(request.user_link_flags, vec!["-lm"]);
    Ok(())
  }

  #[test]
  fn dynamic_library_feeds_dependent_link() -> LuaResult<()> {
    let (lua, manifest) = create_test_runtime()?;
    lua
      .load(format!(
        r#"
          local lib = cc_common.link{{ {ctx} name = "util", output_type = "dynamic_library" }}
          cc_common.link{{ {ctx} name = "app", linking_contexts = {{ lib.linking_context }} }}
        "#,
        ctx = LINK_CONTEXT
      ))
      .exec()?;

    let m = manifest.borrow();
    assert_eq!(m.links.len(), 2);
    let app = &m.links["app"];
    assert_eq!(app.libraries.len(), 1);
    assert_eq!(app.libraries[0].path(), "libutil.so");
    Ok(())
  }

  #[test]
  fn grep_includes_is_recorded() -> LuaResult<()> {
    let (lua, manifest) = create_test_runtime()?;
    lua
      .load(link_call(r#"name = "app", grep_includes = file("tools/grep-includes"),"#))
      .exec()?;
    let m = manifest.borrow();
    assert_eq!(
      m.links["app"].grep_includes.as_ref().map(|f| f.path()),
      Some("tools/grep-includes")
    );
    Ok(())
  }

  #[test]
  fn explicit_none_main_output_falls_back_to_name() -> LuaResult<()> {
    let (lua, _) = create_test_runtime()?;
    let path: String = lua
      .load(format!(
        "return cc_common.link{{ {} name = 'tool', main_output = None }}.executable.path",
        LINK_CONTEXT
      ))
      .eval()?;
    assert_eq!(path, "tool");
    Ok(())
  }

  #[test]
  fn duplicate_output_is_an_eval_error() -> LuaResult<()> {
    let (lua, _) = create_test_runtime()?;
    lua.load(link_call(r#"name = "app","#)).exec()?;
    let err = lua.load(link_call(r#"name = "app","#)).exec().unwrap_err();
    assert!(dsl_error(&err).is_eval_error());
    Ok(())
  }
}

mod compilation_outputs {
  use super::*;

  #[test]
  fn create_rejects_non_file_elements() -> LuaResult<()> {
    let (lua, _) = create_test_runtime()?;
    let err = lua
      .load("return cc_common.create_compilation_outputs{ objects = depset{ 'main.o' } }")
      .exec()
      .unwrap_err();
    assert!(dsl_error(&err).is_eval_error());
    Ok(())
  }

  #[test]
  fn create_rejects_plain_lists() -> LuaResult<()> {
    let (lua, _) = create_test_runtime()?;
    let err = lua
      .load("return cc_common.create_compilation_outputs{ objects = { file('main.o') } }")
      .exec()
      .unwrap_err();
    assert!(dsl_error(&err).is_type_error());
    Ok(())
  }

  #[test]
  fn merge_keeps_first_seen_order() -> LuaResult<()> {
    let (lua, _) = create_test_runtime()?;
    let paths: Vec<String> = lua
      .load(
        r#"
          local a = cc_common.create_compilation_outputs{ objects = depset{ file("a.o"), file("b.o") } }
          local b = cc_common.create_compilation_outputs{ objects = depset{ file("b.o"), file("c.o") } }
          local merged = cc_common.merge_compilation_outputs{ compilation_outputs = { a, b } }
          local paths = {}
          for _, f in ipairs(merged.objects) do
            table.insert(paths, f.path)
          end
          return paths
        "#,
      )
      .eval()?;
    assert_eq!(paths, vec!["a.o", "b.o", "c.o"]);
    Ok(())
  }

  #[test]
  fn merge_with_no_arguments_is_empty() -> LuaResult<()> {
    let (lua, _) = create_test_runtime()?;
    let count: i64 = lua
      .load("return #cc_common.merge_compilation_outputs().objects")
      .eval()?;
    assert_eq!(count, 0);
    Ok(())
  }

  #[test]
  fn merge_rejects_other_values() -> LuaResult<()> {
    let (lua, _) = create_test_runtime()?;
    let err = lua
      .load("return cc_common.merge_compilation_outputs{ compilation_outputs = { 'x' } }")
      .exec()
      .unwrap_err();
    assert!(dsl_error(&err).is_eval_error());
    Ok(())
  }
}
