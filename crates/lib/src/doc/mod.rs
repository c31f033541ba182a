//! Reference documentation for built-in modules.
//!
//! A [`ModuleDoc`] is assembled once when a module is registered and is
//! read-only afterwards. Methods are ordered with US English collation so
//! rendered docs are stable across locales, and operations sharing a short
//! name are listed under their disambiguated names (`foo(x)`, `foo(x, y)`).

mod module_doc;

pub use module_doc::*;
