//! Manifest types for kiln.
//!
//! The manifest captures everything a configuration declared while it was
//! evaluated. Native operations record into it through the evaluation thread;
//! nothing in it is executed by kiln itself.
//!
//! # Ordering
//!
//! Link requests are keyed by output path in a [`BTreeMap`], so serialization
//! and the manifest hash are deterministic.
//!
//! # Example
//!
//! ```json
//! {
//!   "links": {
//!     "app/bin": { "name": "bin", "output_type": "executable", ... }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cc::LinkRequest;
use crate::util::hash::Hashable;

/// Declarations recorded by one evaluation.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
  /// Link requests, keyed by the path of the artifact they produce.
  pub links: BTreeMap<String, LinkRequest>,
}

impl Manifest {
  /// Record a link request. Returns the already recorded request when another
  /// link produces the same output.
  pub fn add_link(&mut self, request: LinkRequest) -> Result<(), &LinkRequest> {
    let path = request.output.path().to_string();
    if self.links.contains_key(&path) {
      return Err(&self.links[&path]);
    }
    self.links.insert(path, request);
    Ok(())
  }

  pub fn is_empty(&self) -> bool {
    self.links.is_empty()
  }
}

impl Hashable for Manifest {}
