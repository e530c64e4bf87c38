//! Cache key derivation from an operation's identity and call arguments.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Write};

/// Arguments of one logical call, as they take part in the cache key.
///
/// Positional arguments keep their call order; keyword arguments are kept
/// sorted by name so the order they were supplied in does not matter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallArgs {
  positional: Vec<String>,
  keywords: BTreeMap<String, String>,
}

impl CallArgs {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append a positional argument.
  pub fn arg(mut self, value: impl Display) -> Self {
    self.positional.push(value.to_string());
    self
  }

  /// Set a keyword argument, replacing any earlier value for `name`.
  pub fn kwarg(mut self, name: &str, value: impl Display) -> Self {
    self.keywords.insert(name.to_string(), value.to_string());
    self
  }
}

/// A deterministic cache key.
///
/// Every field is written with its byte length in front of it, so an
/// argument containing the separator can never be confused with two
/// shorter arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
  /// Derive the key for calling `operation` with `args`.
  pub fn derive(operation: &str, args: &CallArgs) -> Self {
    let mut key = String::new();
    push_field(&mut key, 'o', operation);
    for value in &args.positional {
      push_field(&mut key, 'p', value);
    }
    for (name, value) in &args.keywords {
      push_field(&mut key, 'k', name);
      push_field(&mut key, 'v', value);
    }
    Self(key)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// SHA256 of the logical key, hex encoded: fixed length and safe as a file name.
  pub fn digest(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.0.as_bytes());
    hex::encode(hasher.finalize())
  }
}

impl Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

fn push_field(key: &mut String, tag: char, value: &str) {
  // Writing into a String cannot fail.
  let _ = write!(key, "{}{}:{}", tag, value.len(), value);
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  #[test]
  fn identical_calls_yield_identical_keys() {
    let a = CacheKey::derive(
      "list_events_for_day",
      &CallArgs::new().arg("2024-05-01").kwarg("sport", "football"),
    );
    let b = CacheKey::derive(
      "list_events_for_day",
      &CallArgs::new().arg("2024-05-01").kwarg("sport", "football"),
    );

    assert_eq!(a, b);
    assert_eq!(a.digest(), b.digest());
  }

  #[test]
  fn keyword_order_does_not_matter() {
    let a = CacheKey::derive("op", &CallArgs::new().kwarg("a", 1).kwarg("b", 2));
    let b = CacheKey::derive("op", &CallArgs::new().kwarg("b", 2).kwarg("a", 1));
    assert_eq!(a, b);
  }

  #[test]
  fn different_arguments_yield_different_keys() {
    let calls = [
      CallArgs::new(),
      CallArgs::new().arg(1),
      CallArgs::new().arg(12),
      CallArgs::new().arg(1).arg(2),
      CallArgs::new().arg(2).arg(1),
      CallArgs::new().arg("a:b"),
      CallArgs::new().arg("a").arg("b"),
      CallArgs::new().arg("sport=football"),
      CallArgs::new().kwarg("sport", "football"),
      CallArgs::new().kwarg("sport", "tennis"),
      CallArgs::new().kwarg("sport=", "football"),
      CallArgs::new().arg("p1:x"),
      CallArgs::new().arg("").arg(""),
      CallArgs::new().arg(""),
    ];

    let keys: Vec<CacheKey> = calls
      .iter()
      .map(|args| CacheKey::derive("op", args))
      .collect();

    for (i, a) in keys.iter().enumerate() {
      for b in &keys[i + 1..] {
        assert_ne!(a, b, "collision between {} and {}", a, b);
        assert_ne!(a.digest(), b.digest());
      }
    }
  }

  #[test]
  fn operation_identity_is_part_of_the_key() {
    let args = CallArgs::new().arg(42);
    assert_ne!(
      CacheKey::derive("fetch_event", &args),
      CacheKey::derive("fetch_event_stats", &args)
    );
  }

  #[test]
  fn digest_is_hex_sha256() {
    let digest = CacheKey::derive("op", &CallArgs::new()).digest();
    assert_eq!(digest.len(), 64);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
  }

  type RawArgs = (Vec<String>, BTreeMap<String, String>);

  /// Short strings that lean on the separator and digits.
  fn arb_field() -> impl Strategy<Value = String> {
    "[a-c0-9:=]{0,6}"
  }

  fn arb_args() -> impl Strategy<Value = RawArgs> {
    (
      prop::collection::vec(arb_field(), 0..4),
      prop::collection::btree_map("[a-c0-9:]{1,4}", arb_field(), 0..3),
    )
  }

  fn build(raw: &RawArgs) -> CallArgs {
    let (positional, keywords) = raw;
    let args = positional.iter().fold(CallArgs::new(), |args, v| args.arg(v));
    keywords
      .iter()
      .fold(args, |args, (name, value)| args.kwarg(name, value))
  }

  proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_same_call_same_key(op in "[a-z_]{1,12}", raw in arb_args()) {
      let forward = build(&raw);
      let mut reversed = raw.0.iter().fold(CallArgs::new(), |args, v| args.arg(v));
      for (name, value) in raw.1.iter().rev() {
        reversed = reversed.kwarg(name, value);
      }

      let key = CacheKey::derive(&op, &forward);
      prop_assert_eq!(&key, &CacheKey::derive(&op, &forward));
      prop_assert_eq!(&key, &CacheKey::derive(&op, &reversed));
      prop_assert_eq!(key.digest(), CacheKey::derive(&op, &reversed).digest());
    }

    #[test]
    fn prop_different_calls_different_keys(
      op_a in "[a-z_:0-9]{1,8}",
      op_b in "[a-z_:0-9]{1,8}",
      a in arb_args(),
      b in arb_args(),
    ) {
      prop_assume!(op_a != op_b || a != b);

      let key_a = CacheKey::derive(&op_a, &build(&a));
      let key_b = CacheKey::derive(&op_b, &build(&b));
      prop_assert_ne!(&key_a, &key_b);
      prop_assert_ne!(key_a.digest(), key_b.digest());
    }
  }
}
