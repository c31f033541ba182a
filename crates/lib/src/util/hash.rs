//! Hashing utilities for stable identities.
//!
//! This module provides:
//! - `ObjectHash`: A truncated 20-character hash used as a printable identity
//! - `Hashable`: Fingerprinting of any serializable value
//! - `hash_bytes()`: Arbitrary byte hashing

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::OBJ_HASH_PREFIX_LEN;

pub type HashError = serde_json::Error;

/// A content-addressed hash identifying a unique object.
///
/// The hash is a 20-character truncated SHA-256 of the JSON-serialized value.
/// Values whose serialization is canonical (sorted sets and maps) hash the same
/// across processes, which makes the fingerprint usable as a persisted key.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string, e.g., `"a1b2c3d4e5f6789012ab"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    let full = hash_bytes(serialized.as_bytes());
    Ok(ObjectHash(full[..OBJ_HASH_PREFIX_LEN].to_string()))
  }
}

/// Hash arbitrary bytes.
///
/// Returns the full 64-character SHA256 hash.
pub fn hash_bytes(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;

  #[derive(Serialize)]
  struct Sample {
    name: &'static str,
    tags: BTreeSet<&'static str>,
  }

  impl Hashable for Sample {}

  #[test]
  fn hash_is_truncated_hex() {
    let sample = Sample {
      name: "a",
      tags: BTreeSet::new(),
    };
    let hash = sample.compute_hash().unwrap();
    assert_eq!(hash.0.len(), OBJ_HASH_PREFIX_LEN);
    assert!(hash.0.chars().all(|c| c.is_ascii_hexdigit()));
  }

  #[test]
  fn set_order_does_not_change_hash() {
    let a = Sample {
      name: "a",
      tags: ["x", "y"].into_iter().collect(),
    };
    let b = Sample {
      name: "a",
      tags: ["y", "x"].into_iter().collect(),
    };
    assert_eq!(a.compute_hash().unwrap(), b.compute_hash().unwrap());
  }

  #[test]
  fn hash_bytes_is_full_length() {
    assert_eq!(hash_bytes(b"hello world").len(), 64);
  }
}
