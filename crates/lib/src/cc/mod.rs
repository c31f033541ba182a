//! The `cc_common` module.
//!
//! - [`catalog`] describes every operation and parameter exposed to Lua.
//! - [`CcModuleApi`] is the interface a C++ rules implementation provides;
//!   [`CcCommonModule`] adapts one into a registrable native module.
//! - [`DeclaringCcModule`] is the built-in implementation. It validates calls
//!   and records [`LinkRequest`]s into the evaluation manifest.
//!
//! The handle types in [`types`] cross the Lua boundary as opaque userdata.

mod api;
pub mod catalog;
mod manifest;
mod module;
pub mod types;

use std::sync::Arc;

pub use api::*;
pub use manifest::LinkRequest;
pub use module::DeclaringCcModule;
pub use types::*;

use crate::dsl::{ModuleRegistry, RegistryError};

/// Register the built-in `cc_common` module.
pub fn register(registry: &mut ModuleRegistry) -> Result<(), RegistryError> {
  registry.register(Arc::new(CcCommonModule::new(DeclaringCcModule::new())))
}
