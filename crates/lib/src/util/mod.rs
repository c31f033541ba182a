//! Shared utilities.
//!
//! Common utilities used across the crate including hashing and collation.

pub mod collation;
pub mod hash;
