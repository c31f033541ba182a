//! US English collation for stable, locale-independent alphabetical ordering.
//!
//! Strings are compared in three passes:
//! 1. Primary: whitespace, then punctuation (in the conventional US English
//!    order), then digits, then letters compared case-insensitively.
//! 2. Tertiary: at the first case difference, lowercase sorts before uppercase.
//! 3. Code point order as a final tie-break, so the order is total and agrees
//!    with string equality.

use std::cmp::Ordering;

/// Punctuation in the order the US English rules place it.
const PUNCTUATION_ORDER: &str = "_-,;:!?.'\"()[]{}@*/\\&#%`^+<=>|~$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Class {
  Whitespace,
  Punctuation,
  Digit,
  Letter,
  Other,
}

fn primary(c: char) -> (Class, u32) {
  if c.is_whitespace() {
    (Class::Whitespace, c as u32)
  } else if let Some(index) = PUNCTUATION_ORDER.find(c) {
    (Class::Punctuation, index as u32)
  } else if let Some(digit) = c.to_digit(10) {
    (Class::Digit, digit)
  } else if c.is_alphabetic() {
    let folded = c.to_lowercase().next().unwrap_or(c);
    (Class::Letter, folded as u32)
  } else if c.is_ascii_punctuation() {
    (Class::Punctuation, PUNCTUATION_ORDER.len() as u32 + c as u32)
  } else {
    (Class::Other, c as u32)
  }
}

fn tertiary(c: char) -> u8 {
  if c.is_uppercase() { 1 } else { 0 }
}

/// Compare two strings using US English collation.
pub fn compare(a: &str, b: &str) -> Ordering {
  a.chars()
    .map(primary)
    .cmp(b.chars().map(primary))
    .then_with(|| a.chars().map(tertiary).cmp(b.chars().map(tertiary)))
    .then_with(|| a.cmp(b))
}

/// A string ordered by [`compare`]; usable as a `BTreeMap` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Collated(pub String);

impl Collated {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for Collated {
  fn from(value: &str) -> Self {
    Collated(value.to_string())
  }
}

impl From<String> for Collated {
  fn from(value: String) -> Self {
    Collated(value)
  }
}

impl Ord for Collated {
  fn cmp(&self, other: &Self) -> Ordering {
    compare(&self.0, &other.0)
  }
}

impl PartialOrd for Collated {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}
