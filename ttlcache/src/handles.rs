use crate::bucket::Bucket;
use crate::error::CacheError;
use crate::hash::{self, RapidBuildHasher};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::shared::CacheShared;

use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;
use std::time::Duration;

/// A thread-safe cache of string keys to values of type `V`, with
/// per-entry expiration.
///
/// `Cache` is a cheap handle: cloning it shares the same store. The janitor
/// thread stops once the last handle (including `Bucket` handles) is
/// dropped.
pub struct Cache<V, H = RapidBuildHasher> {
  pub(crate) shared: Arc<CacheShared<V, H>>,
}

impl<V, H> Clone for Cache<V, H> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<V, H> fmt::Debug for Cache<V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Cache").field("shared", &self.shared).finish()
  }
}

impl<V, H: BuildHasher> Cache<V, H> {
  /// Adds a value under `key`, expiring after `ttl`. A zero `ttl` means the
  /// entry never expires.
  ///
  /// Fails with [`CacheError::Collision`] if `key` already has a live entry;
  /// the existing value is left untouched.
  pub fn add(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError> {
    let fingerprint = self.shared.fingerprint(None, key);
    let value = Arc::new(value);
    let result = self
      .shared
      .with_store(|store, now| store.add_value(fingerprint, value, ttl, now));
    self.shared.record_insert(&result);
    result
  }

  /// Returns the value stored under `key`.
  ///
  /// With refresh on access enabled, a hit also pushes the entry's
  /// expiration out by the configured refresh duration.
  pub fn get(&self, key: &str) -> Result<Arc<V>, CacheError> {
    let fingerprint = self.shared.fingerprint(None, key);
    let refresh = self.shared.refresh;
    let result = self
      .shared
      .with_store(|store, now| store.get_value(fingerprint, now, refresh));
    self.shared.record_lookup(result.is_ok());
    result
  }

  /// Replaces the value stored under `key`. The expiration is unchanged.
  pub fn update(&self, key: &str, value: V) -> Result<(), CacheError> {
    let fingerprint = self.shared.fingerprint(None, key);
    let value = Arc::new(value);
    let result = self
      .shared
      .with_store(|store, now| store.update_value(fingerprint, value, now));
    if result.is_ok() {
      Metrics::bump(&self.shared.metrics.updates, 1);
    }
    result
  }

  /// Pushes the expiration of `key` out by `delta`.
  pub fn extend(&self, key: &str, delta: Duration) -> Result<(), CacheError> {
    let fingerprint = self.shared.fingerprint(None, key);
    let result = self
      .shared
      .with_store(|store, now| store.extend(fingerprint, delta, now));
    if result.is_ok() {
      Metrics::bump(&self.shared.metrics.extensions, 1);
    }
    result
  }

  /// Deletes the entry under `key`. Deleting a missing key fails with
  /// [`CacheError::NotFound`].
  ///
  /// Deleting the name of a bucket deletes the bucket record; the entries
  /// that were added through it stay in the cache until they expire.
  pub fn delete(&self, key: &str) -> Result<(), CacheError> {
    let fingerprint = self.shared.fingerprint(None, key);
    let result = self
      .shared
      .with_store(|store, now| store.delete(fingerprint, now));
    if result.is_ok() {
      Metrics::bump(&self.shared.metrics.deletes, 1);
    }
    result
  }

  /// Returns `true` if `key` has a live entry. Unlike `get`, this does not
  /// refresh the entry or count as a lookup.
  pub fn contains(&self, key: &str) -> bool {
    let fingerprint = self.shared.fingerprint(None, key);
    self
      .shared
      .with_store(|store, now| store.contains(fingerprint, now))
  }

  /// Returns the bucket called `name`, creating it on first use.
  ///
  /// The bucket is itself an entry of this cache, stored under `name` with no
  /// expiration. Fails with [`CacheError::Collision`] if `name` holds a
  /// regular value and with [`CacheError::InvalidBucketName`] if it contains
  /// a NUL byte.
  pub fn bucket(&self, name: &str) -> Result<Bucket<V, H>, CacheError> {
    if !hash::is_valid_namespace(name) {
      return Err(CacheError::InvalidBucketName(name.to_string()));
    }

    let fingerprint = self.shared.fingerprint(None, name);
    self
      .shared
      .with_store(|store, now| store.ensure_bucket(fingerprint, name, now))?;
    Ok(Bucket::new(Arc::clone(&self.shared), name, fingerprint))
  }
}

impl<V, H> Cache<V, H> {
  /// Number of live entries, bucket records included. Entries that have
  /// expired but were not yet swept are still counted.
  pub fn len(&self) -> usize {
    self.shared.store.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Removes every entry, bucket records included, without notifying the
  /// expiration listener.
  pub fn clear(&self) {
    self.shared.store.lock().clear();
  }

  /// Sweeps expired entries right away instead of waiting for the janitor,
  /// and returns how many were removed.
  pub fn run_pending_expirations(&self) -> usize {
    self.shared.sweep_now()
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    let (live, slots) = {
      let store = self.shared.store.lock();
      (store.len(), store.slot_count())
    };
    self.shared.metrics.snapshot(live, slots)
  }
}
