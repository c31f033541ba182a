//! Lua-level integration tests for kiln-lib.

mod cc_common_tests;
mod common;
mod docs_tests;
