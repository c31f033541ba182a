mod docs;
mod eval;
mod key;

pub use docs::cmd_docs;
pub use eval::cmd_eval;
pub use key::cmd_key;
