//! Key fingerprinting.
//!
//! Every key is reduced to a 64-bit fingerprint before it reaches the slot
//! store. Bucket keys are namespaced by hashing the composite byte string
//! `bucket name + SEPARATOR + key`, so a bucket key and a flat key can only
//! share a fingerprint through a genuine hash collision.

use std::hash::{BuildHasher, BuildHasherDefault, Hasher};

/// Separates a bucket name from a key inside the hashed composite.
/// Bucket names may not contain it.
pub(crate) const SEPARATOR: u8 = 0;

/// The default `BuildHasher` of the cache.
///
/// `RapidHasher::default()` starts from a fixed seed, so fingerprints depend
/// only on the key bytes and the ones written by
/// [`Cache::save`](crate::Cache::save) remain valid when the file is loaded by
/// another process.
pub type RapidBuildHasher = BuildHasherDefault<rapidhash::RapidHasher>;

/// Computes the fingerprint of a flat key, or of a bucket key when
/// `namespace` is set.
#[inline]
pub(crate) fn fingerprint<H: BuildHasher>(hasher: &H, namespace: Option<&str>, key: &str) -> u64 {
  let mut state = hasher.build_hasher();
  match namespace {
    Some(namespace) => {
      let mut composite = Vec::with_capacity(namespace.len() + 1 + key.len());
      composite.extend_from_slice(namespace.as_bytes());
      composite.push(SEPARATOR);
      composite.extend_from_slice(key.as_bytes());
      state.write(&composite);
    }
    None => state.write(key.as_bytes()),
  }
  state.finish()
}

/// Returns `true` if `name` can be used as a bucket name.
#[inline]
pub(crate) fn is_valid_namespace(name: &str) -> bool {
  !name.as_bytes().contains(&SEPARATOR)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn single_write(bytes: &[u8]) -> u64 {
    let mut hasher = RapidBuildHasher::default().build_hasher();
    hasher.write(bytes);
    hasher.finish()
  }

  #[test]
  fn default_hasher_is_deterministic() {
    let a = RapidBuildHasher::default();
    let b = RapidBuildHasher::default();
    assert_eq!(fingerprint(&a, None, "key"), fingerprint(&b, None, "key"));
    assert_eq!(
      fingerprint(&a, Some("bucket"), "key"),
      fingerprint(&b, Some("bucket"), "key")
    );
  }

  #[test]
  fn namespaced_fingerprint_hashes_the_composite() {
    let hasher = RapidBuildHasher::default();
    assert_eq!(fingerprint(&hasher, Some("b"), "x"), single_write(b"b\0x"));
    assert_eq!(fingerprint(&hasher, None, "x"), single_write(b"x"));
    assert_ne!(
      fingerprint(&hasher, Some("b"), "x"),
      fingerprint(&hasher, None, "x")
    );
    assert_ne!(
      fingerprint(&hasher, Some("b"), "x"),
      fingerprint(&hasher, Some("c"), "x")
    );
  }

  #[test]
  fn separator_is_rejected_in_names() {
    assert!(is_valid_namespace("my-bucket"));
    assert!(!is_valid_namespace("bad\0name"));
  }
}
