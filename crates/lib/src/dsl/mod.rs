//! The native side of the config language.
//!
//! Native modules describe each operation they expose with an
//! [`OperationDescriptor`]. A call from the config language is bound against
//! the descriptor ([`bind()`]), type-checked, and only then dispatched to the
//! module's implementation through the [`ModuleRegistry`].
//!
//! Omitted optional parameters without a default arrive as [`Arg::Unbound`];
//! an explicit `None` from the caller arrives as [`DslValue::None`].

pub mod bind;
mod error;
pub mod registry;
mod thread;
mod types;
mod value;

pub use bind::{Arg, BoundArgs, CallArgs, bind};
pub use error::DslError;
pub use registry::{ModuleDefinition, ModuleRegistry, NativeModule, RegisteredModule, RegistryError};
pub use thread::{EvalThread, Interrupt};
pub use types::*;
pub use value::*;
