//! Named partitions of the cache's key space.

use crate::error::CacheError;
use crate::hash::RapidBuildHasher;
use crate::iter::BucketIter;
use crate::metrics::Metrics;
use crate::shared::CacheShared;

use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The metadata of a bucket, stored as a cache entry under the bucket's name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct BucketRecord {
  pub(crate) name: String,
  /// Fingerprints added through the bucket, in insertion order.
  pub(crate) members: Vec<u64>,
}

impl BucketRecord {
  pub(crate) fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      members: Vec::new(),
    }
  }

  /// Appends `fingerprint` unless it is already a member. Returns `true` if
  /// it was appended.
  pub(crate) fn insert(&mut self, fingerprint: u64) -> bool {
    if self.members.contains(&fingerprint) {
      return false;
    }
    self.members.push(fingerprint);
    true
  }

  /// Removes the first occurrence of `fingerprint`.
  pub(crate) fn remove(&mut self, fingerprint: u64) -> bool {
    match self.members.iter().position(|member| *member == fingerprint) {
      Some(position) => {
        self.members.remove(position);
        true
      }
      None => false,
    }
  }
}

/// A named view over the cache that keeps track of the keys added through
/// it.
///
/// Keys are namespaced by the bucket name before hashing, so a bucket key
/// never addresses the flat entry of the same name. Values share the cache's
/// storage, lock and janitor.
///
/// Every operation fails with [`CacheError::NotFound`] once the bucket
/// itself has been deleted from the cache.
pub struct Bucket<V, H = RapidBuildHasher> {
  pub(crate) shared: Arc<CacheShared<V, H>>,
  name: Arc<str>,
  /// Flat fingerprint of the bucket name, where the record lives.
  pub(crate) fingerprint: u64,
}

impl<V, H> Clone for Bucket<V, H> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
      name: Arc::clone(&self.name),
      fingerprint: self.fingerprint,
    }
  }
}

impl<V, H> fmt::Debug for Bucket<V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Bucket")
      .field("name", &self.name)
      .field("fingerprint", &self.fingerprint)
      .finish_non_exhaustive()
  }
}

impl<V, H> Bucket<V, H> {
  pub(crate) fn new(shared: Arc<CacheShared<V, H>>, name: &str, fingerprint: u64) -> Self {
    Self {
      shared,
      name: Arc::from(name),
      fingerprint,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Number of keys added through this bucket and not deleted through it.
  ///
  /// Keys that expired on their own are still counted until they are
  /// deleted through the bucket or removed by [`Bucket::prune`].
  pub fn len(&self) -> usize {
    let bucket = self.fingerprint;
    self
      .shared
      .with_store(|store, now| store.bucket(bucket, now).map_or(0, |record| record.members.len()))
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Drops members whose entries are no longer live and returns how many
  /// were dropped.
  pub fn prune(&self) -> Result<usize, CacheError> {
    let bucket = self.fingerprint;
    self.shared.with_store(|store, now| {
      let members = store
        .bucket(bucket, now)
        .ok_or(CacheError::NotFound)?
        .members
        .clone();
      let live: Vec<u64> = members
        .iter()
        .copied()
        .filter(|member| store.contains(*member, now))
        .collect();
      let pruned = members.len() - live.len();

      if let Some(record) = store.bucket_mut(bucket, now) {
        record.members = live;
      }
      Ok(pruned)
    })
  }

  /// Returns a fresh cursor over the bucket's members, in insertion order.
  pub fn iter(&self) -> BucketIter<V, H> {
    BucketIter::new(self.clone())
  }
}

impl<V, H: BuildHasher> Bucket<V, H> {
  #[inline]
  pub(crate) fn key_fingerprint(&self, key: &str) -> u64 {
    self.shared.fingerprint(Some(&self.name), key)
  }

  /// Adds a value under `key` in this bucket, expiring after `ttl`. A zero
  /// `ttl` means the entry never expires.
  ///
  /// If the cache rejects the insert, the key is not left behind as a
  /// member.
  pub fn add(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError> {
    let bucket = self.fingerprint;
    let fingerprint = self.key_fingerprint(key);
    let value = Arc::new(value);

    let result = self.shared.with_store(|store, now| {
      let appended = store
        .bucket_mut(bucket, now)
        .ok_or(CacheError::NotFound)?
        .insert(fingerprint);

      let added = store.add_value(fingerprint, value, ttl, now);
      if added.is_err() && appended {
        if let Some(record) = store.bucket_mut(bucket, now) {
          record.remove(fingerprint);
        }
      }
      added
    });

    self.shared.record_insert(&result);
    result
  }

  /// Returns the value stored under `key` in this bucket.
  pub fn get(&self, key: &str) -> Result<Arc<V>, CacheError> {
    let bucket = self.fingerprint;
    let fingerprint = self.key_fingerprint(key);
    let refresh = self.shared.refresh;

    let result = self.shared.with_store(|store, now| {
      store.bucket(bucket, now).ok_or(CacheError::NotFound)?;
      store.get_value(fingerprint, now, refresh)
    });

    self.shared.record_lookup(result.is_ok());
    result
  }

  /// Replaces the value stored under `key` in this bucket.
  pub fn update(&self, key: &str, value: V) -> Result<(), CacheError> {
    let bucket = self.fingerprint;
    let fingerprint = self.key_fingerprint(key);
    let value = Arc::new(value);

    let result = self.shared.with_store(|store, now| {
      store.bucket(bucket, now).ok_or(CacheError::NotFound)?;
      store.update_value(fingerprint, value, now)
    });

    if result.is_ok() {
      Metrics::bump(&self.shared.metrics.updates, 1);
    }
    result
  }

  /// Pushes the expiration of `key` in this bucket out by `delta`.
  pub fn extend(&self, key: &str, delta: Duration) -> Result<(), CacheError> {
    let bucket = self.fingerprint;
    let fingerprint = self.key_fingerprint(key);

    let result = self.shared.with_store(|store, now| {
      store.bucket(bucket, now).ok_or(CacheError::NotFound)?;
      store.extend(fingerprint, delta, now)
    });

    if result.is_ok() {
      Metrics::bump(&self.shared.metrics.extensions, 1);
    }
    result
  }

  /// Deletes `key` from this bucket and from the cache.
  pub fn delete(&self, key: &str) -> Result<(), CacheError> {
    let bucket = self.fingerprint;
    let fingerprint = self.key_fingerprint(key);

    let result = self.shared.with_store(|store, now| {
      store
        .bucket_mut(bucket, now)
        .ok_or(CacheError::NotFound)?
        .remove(fingerprint);
      store.delete(fingerprint, now)
    });

    if result.is_ok() {
      Metrics::bump(&self.shared.metrics.deletes, 1);
    }
    result
  }
}
