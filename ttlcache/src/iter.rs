//! A forward-only cursor over the members of a bucket.

use crate::bucket::Bucket;
use crate::error::CacheError;
use crate::hash::RapidBuildHasher;
use crate::metrics::Metrics;

use std::fmt;
use std::sync::Arc;

/// A cursor over the keys added through a [`Bucket`], in insertion order.
///
/// The cursor reads the membership list live, under the store lock, one
/// position at a time. Members added while iterating are visited if the
/// cursor has not yet passed their position. Members whose entries have
/// expired or been deleted resolve to no item but still take up a position.
///
/// ```
/// # use fibre_ttlcache::CacheBuilder;
/// # use std::time::Duration;
/// let cache = CacheBuilder::<u32>::default().build().unwrap();
/// let bucket = cache.bucket("scores").unwrap();
/// bucket.add("a", 1, Duration::ZERO).unwrap();
///
/// let mut cursor = bucket.iter();
/// while cursor.advance() {
///   if let Some(score) = cursor.item() {
///     cursor.update(*score + 10).unwrap();
///   }
/// }
/// assert_eq!(*bucket.get("a").unwrap(), 11);
/// ```
pub struct BucketIter<V, H = RapidBuildHasher> {
  bucket: Bucket<V, H>,
  /// Index of the next membership entry to visit.
  position: usize,
  /// Fingerprint captured by the last successful `advance`.
  current: Option<u64>,
  item: Option<Arc<V>>,
}

impl<V, H> fmt::Debug for BucketIter<V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BucketIter")
      .field("bucket", &self.bucket.name())
      .field("position", &self.position)
      .field("current", &self.current)
      .field("has_item", &self.item.is_some())
      .finish()
  }
}

impl<V, H> BucketIter<V, H> {
  pub(crate) fn new(bucket: Bucket<V, H>) -> Self {
    Self {
      bucket,
      position: 0,
      current: None,
      item: None,
    }
  }

  /// Moves to the next member. Returns `false` once the membership list is
  /// exhausted, after which `item` is `None` and `update` fails.
  ///
  /// A member that no longer resolves to a live value still counts as a
  /// step; `item` is `None` for it. Each step is recorded as a hit or a
  /// miss, like [`Bucket::get`].
  pub fn advance(&mut self) -> bool {
    let bucket = self.bucket.fingerprint;
    let position = self.position;
    let refresh = self.bucket.shared.refresh;

    let step = self.bucket.shared.with_store(|store, now| {
      let fingerprint = *store.bucket(bucket, now)?.members.get(position)?;
      let item = store.get_value(fingerprint, now, refresh).ok();
      Some((fingerprint, item))
    });

    match step {
      Some((fingerprint, item)) => {
        self.bucket.shared.record_lookup(item.is_some());
        self.position += 1;
        self.current = Some(fingerprint);
        self.item = item;
        true
      }
      None => {
        self.current = None;
        self.item = None;
        false
      }
    }
  }

  /// The value resolved by the last `advance`, if any.
  pub fn item(&self) -> Option<Arc<V>> {
    self.item.clone()
  }

  /// Replaces the value of the member the cursor is on.
  ///
  /// Fails with [`CacheError::NotFound`] before the first `advance`, after
  /// the cursor is exhausted, or if the member's entry is no longer live.
  /// The cursor's `item` keeps the value it resolved.
  pub fn update(&mut self, value: V) -> Result<(), CacheError> {
    let fingerprint = self.current.ok_or(CacheError::NotFound)?;
    let value = Arc::new(value);

    let result = self
      .bucket
      .shared
      .with_store(|store, now| store.update_value(fingerprint, value, now));

    if result.is_ok() {
      Metrics::bump(&self.bucket.shared.metrics.updates, 1);
    }
    result
  }
}

impl<V, H> Iterator for BucketIter<V, H> {
  type Item = Arc<V>;

  /// Advances until a member resolves to a live value. The cursor is left on
  /// that member, so `update` applies to the value just returned.
  fn next(&mut self) -> Option<Self::Item> {
    while self.advance() {
      if let Some(item) = self.item() {
        return Some(item);
      }
    }
    None
  }
}
