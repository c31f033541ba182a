use std::cell::RefCell;
use std::rc::Rc;

use tokio_util::sync::CancellationToken;

use super::error::DslError;
use crate::manifest::Manifest;

/// Cooperative cancellation for one evaluation.
///
/// Clones share the same underlying token, so a clone handed to another
/// thread can interrupt the evaluation.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
  token: CancellationToken,
}

impl Interrupt {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_token(token: CancellationToken) -> Self {
    Self { token }
  }

  pub fn cancel(&self) {
    self.token.cancel();
  }

  pub fn is_cancelled(&self) -> bool {
    self.token.is_cancelled()
  }

  /// Fail with [`DslError::Interrupted`] once cancelled.
  pub fn check(&self) -> Result<(), DslError> {
    if self.token.is_cancelled() {
      return Err(DslError::Interrupted);
    }
    Ok(())
  }
}

/// The evaluation context handed to operations that ask for it.
#[derive(Debug, Clone)]
pub struct EvalThread {
  name: String,
  interrupt: Interrupt,
  manifest: Rc<RefCell<Manifest>>,
}

impl EvalThread {
  pub fn new(name: &str, interrupt: Interrupt, manifest: Rc<RefCell<Manifest>>) -> Self {
    Self {
      name: name.to_string(),
      interrupt,
      manifest,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn interrupt(&self) -> &Interrupt {
    &self.interrupt
  }

  /// Declarations recorded by this evaluation.
  pub fn manifest(&self) -> &Rc<RefCell<Manifest>> {
    &self.manifest
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cloned_interrupt_cancels_original() {
    let interrupt = Interrupt::new();
    assert_eq!(interrupt.check(), Ok(()));
    interrupt.clone().cancel();
    assert!(interrupt.is_cancelled());
    assert_eq!(interrupt.check(), Err(DslError::Interrupted));
  }

  #[test]
  fn child_token_follows_parent() {
    let parent = CancellationToken::new();
    let interrupt = Interrupt::from_token(parent.child_token());
    parent.cancel();
    assert!(interrupt.is_cancelled());
  }
}
