use crate::bucket::BucketRecord;
use crate::entry::{Payload, Slot};
use crate::error::CacheError;
use crate::time::{self, NEVER};

use core::fmt;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use ahash::{HashMap, HashMapExt};

/// The expiring slot store.
///
/// Slots live in an append-only vector and are addressed through a
/// fingerprint index. Deleted or expired slots are tombstoned and their
/// positions pushed on a free list for reuse; the vector never shrinks.
///
/// The store does no locking of its own. `CacheShared` keeps it behind the
/// single store-wide mutex, and every method here assumes that lock is held.
pub(crate) struct SlotStore<V> {
  slots: Vec<Slot<V>>,
  index: HashMap<u64, usize>,
  free: Vec<usize>,
  /// Lower bound on the earliest expiration among live slots.
  next_expiry: u64,
  /// Values of entries expired while the lock was held, waiting to be handed
  /// to the expiration listener once it is released.
  pending_expired: Vec<Arc<V>>,
}

impl<V> fmt::Debug for SlotStore<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SlotStore")
      .field("slots", &self.slots.len())
      .field("live", &self.index.len())
      .field("free", &self.free.len())
      .field("next_expiry", &self.next_expiry)
      .finish()
  }
}

impl<V> Default for SlotStore<V> {
  fn default() -> Self {
    Self::new()
  }
}

impl<V> SlotStore<V> {
  pub(crate) fn new() -> Self {
    Self {
      slots: Vec::new(),
      index: HashMap::new(),
      free: Vec::new(),
      next_expiry: NEVER,
      pending_expired: Vec::new(),
    }
  }

  /// Rebuilds a store from raw slots, e.g. when loading a snapshot.
  ///
  /// The index, free list and `next_expiry` are derived from the slots. If
  /// two live slots claim the same fingerprint, the first one wins and the
  /// other is tombstoned.
  #[cfg_attr(not(feature = "serde"), allow(dead_code))]
  pub(crate) fn from_slots(slots: Vec<Slot<V>>) -> Self {
    let mut store = Self {
      slots,
      ..Self::new()
    };

    for idx in 0..store.slots.len() {
      let slot = &mut store.slots[idx];
      if !slot.is_live() || store.index.contains_key(&slot.fingerprint) {
        slot.payload = None;
        store.free.push(idx);
        continue;
      }
      store.index.insert(slot.fingerprint, idx);
      store.next_expiry = store.next_expiry.min(slot.expires_at);
    }

    store
  }

  /// Number of live, mapped entries (user values and bucket records).
  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.index.len()
  }

  /// Total number of slots ever allocated, live or tombstoned.
  #[inline]
  pub(crate) fn slot_count(&self) -> usize {
    self.slots.len()
  }

  #[inline]
  #[cfg_attr(not(feature = "serde"), allow(dead_code))]
  pub(crate) fn slots(&self) -> &[Slot<V>] {
    &self.slots
  }

  #[inline]
  pub(crate) fn next_expiry(&self) -> u64 {
    self.next_expiry
  }

  /// Returns `true` if a sweep at `now` could find expired slots.
  #[inline]
  pub(crate) fn is_due(&self, now: u64) -> bool {
    now >= self.next_expiry
  }

  /// Drains the values expired since the last call.
  #[inline]
  pub(crate) fn take_expired(&mut self) -> Vec<Arc<V>> {
    mem::take(&mut self.pending_expired)
  }

  /// Inserts a user value. Fails with `Collision` if `fingerprint` is live.
  pub(crate) fn add_value(
    &mut self,
    fingerprint: u64,
    value: Arc<V>,
    ttl: Duration,
    now: u64,
  ) -> Result<(), CacheError> {
    self.insert(fingerprint, Payload::Value(value), time::expires_at(now, ttl), now)
  }

  /// Makes sure a bucket record lives under `fingerprint`, creating it with
  /// infinite expiration if needed. Fails with `Collision` if a user value
  /// occupies the fingerprint.
  pub(crate) fn ensure_bucket(&mut self, fingerprint: u64, name: &str, now: u64) -> Result<(), CacheError> {
    match self.live_index(fingerprint, now) {
      Some(idx) => match self.slots[idx].payload {
        Some(Payload::Bucket(_)) => Ok(()),
        _ => Err(CacheError::Collision),
      },
      None => self.insert(
        fingerprint,
        Payload::Bucket(BucketRecord::new(name)),
        NEVER,
        now,
      ),
    }
  }

  /// Returns the value under `fingerprint`. With `refresh` set, a hit also
  /// pushes the entry's expiration out by that duration.
  pub(crate) fn get_value(
    &mut self,
    fingerprint: u64,
    now: u64,
    refresh: Option<Duration>,
  ) -> Result<Arc<V>, CacheError> {
    let idx = self.live_index(fingerprint, now).ok_or(CacheError::NotFound)?;
    let slot = &mut self.slots[idx];
    let value = match &slot.payload {
      Some(Payload::Value(value)) => value.clone(),
      _ => return Err(CacheError::NotFound),
    };

    if let Some(refresh) = refresh {
      slot.expires_at = time::extend(slot.expires_at, refresh);
      self.next_expiry = self.next_expiry.min(slot.expires_at);
    }

    Ok(value)
  }

  /// Replaces the value under `fingerprint`, leaving its expiration as is.
  pub(crate) fn update_value(&mut self, fingerprint: u64, value: Arc<V>, now: u64) -> Result<(), CacheError> {
    let idx = self.live_index(fingerprint, now).ok_or(CacheError::NotFound)?;
    match &mut self.slots[idx].payload {
      Some(Payload::Value(current)) => {
        *current = value;
        Ok(())
      }
      _ => Err(CacheError::NotFound),
    }
  }

  /// Pushes the expiration of `fingerprint` out by `delta`.
  pub(crate) fn extend(&mut self, fingerprint: u64, delta: Duration, now: u64) -> Result<(), CacheError> {
    let idx = self.live_index(fingerprint, now).ok_or(CacheError::NotFound)?;
    let slot = &mut self.slots[idx];
    slot.expires_at = time::extend(slot.expires_at, delta);
    self.next_expiry = self.next_expiry.min(slot.expires_at);
    Ok(())
  }

  /// Tombstones the slot under `fingerprint` and drops its mapping.
  /// The expiration listener is not told about deletions.
  pub(crate) fn delete(&mut self, fingerprint: u64, now: u64) -> Result<(), CacheError> {
    let idx = self.live_index(fingerprint, now).ok_or(CacheError::NotFound)?;
    self.tombstone(idx);
    Ok(())
  }

  /// Returns `true` if `fingerprint` maps to a live, unexpired slot.
  pub(crate) fn contains(&mut self, fingerprint: u64, now: u64) -> bool {
    self.live_index(fingerprint, now).is_some()
  }

  /// Returns the bucket record under `fingerprint`, if there is one.
  pub(crate) fn bucket(&mut self, fingerprint: u64, now: u64) -> Option<&BucketRecord> {
    self.bucket_mut(fingerprint, now).map(|record| &*record)
  }

  pub(crate) fn bucket_mut(&mut self, fingerprint: u64, now: u64) -> Option<&mut BucketRecord> {
    let idx = self.live_index(fingerprint, now)?;
    match &mut self.slots[idx].payload {
      Some(Payload::Bucket(record)) => Some(record),
      _ => None,
    }
  }

  /// Tombstones every slot without notifying the expiration listener.
  pub(crate) fn clear(&mut self) {
    for idx in 0..self.slots.len() {
      if self.slots[idx].is_live() {
        self.tombstone(idx);
      }
    }
    self.next_expiry = NEVER;
  }

  /// Scans every slot, expiring the ones whose time has passed, and
  /// recomputes `next_expiry` from the survivors. Returns the number of
  /// slots expired.
  pub(crate) fn sweep(&mut self, now: u64) -> usize {
    let mut expired = 0;
    let mut nearest = NEVER;

    for idx in 0..self.slots.len() {
      let slot = &self.slots[idx];
      if !slot.is_live() {
        continue;
      }
      if slot.is_expired(now) {
        self.expire(idx);
        expired += 1;
      } else {
        nearest = nearest.min(slot.expires_at);
      }
    }

    self.next_expiry = nearest;
    expired
  }

  /// Resolves `fingerprint` to the index of a live slot, lazily expiring it
  /// if its time has passed. Stale mappings are dropped on the way.
  fn live_index(&mut self, fingerprint: u64, now: u64) -> Option<usize> {
    let idx = *self.index.get(&fingerprint)?;
    let slot = &self.slots[idx];

    if !slot.is_live() {
      self.index.remove(&fingerprint);
      return None;
    }

    if slot.is_expired(now) {
      self.expire(idx);
      return None;
    }

    Some(idx)
  }

  fn insert(&mut self, fingerprint: u64, payload: Payload<V>, expires_at: u64, now: u64) -> Result<(), CacheError> {
    if self.live_index(fingerprint, now).is_some() {
      return Err(CacheError::Collision);
    }

    let slot = Slot::new(fingerprint, payload, expires_at);
    let idx = match self.free.pop() {
      Some(idx) => {
        self.slots[idx] = slot;
        idx
      }
      None => {
        self.slots.push(slot);
        self.slots.len() - 1
      }
    };

    self.index.insert(fingerprint, idx);
    self.next_expiry = self.next_expiry.min(expires_at);
    Ok(())
  }

  /// Tombstones a live slot, queueing its value for the expiration listener.
  fn expire(&mut self, idx: usize) {
    if let Some(Payload::Value(value)) = self.tombstone(idx) {
      self.pending_expired.push(value);
    }
  }

  fn tombstone(&mut self, idx: usize) -> Option<Payload<V>> {
    let slot = &mut self.slots[idx];
    let payload = slot.payload.take()?;
    if self.index.get(&slot.fingerprint) == Some(&idx) {
      self.index.remove(&slot.fingerprint);
    }
    self.free.push(idx);
    Some(payload)
  }
}
