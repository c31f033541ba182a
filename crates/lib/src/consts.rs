//! Constants shared across the crate.

/// Length of the truncated hex digest used by [`crate::util::hash::ObjectHash`].
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Function tag under which toolchain request keys are memoized by the planner.
pub const TOOLCHAIN_RESOLUTION: &str = "TOOLCHAIN_RESOLUTION";

/// Root prepended to source paths derived from a module's backing type.
pub const DOC_SOURCE_ROOT: &str = "src/main/java";

/// Source path reported for top-level modules.
pub const NO_SOURCE_FILE: &str = "NONE";

/// Name of the Lua global holding the explicit-none sentinel.
pub const NONE_GLOBAL: &str = "None";

/// Name of the Lua global holding the rule context (actions, toolchain, features).
pub const CTX_GLOBAL: &str = "ctx";

/// Lua VM instructions executed between checks for a cancelled evaluation.
pub const INTERRUPT_CHECK_INSTRUCTIONS: u32 = 1000;
