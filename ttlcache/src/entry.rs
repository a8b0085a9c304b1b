use crate::bucket::BucketRecord;

use std::sync::Arc;

/// What a live slot holds: either a user value or the metadata of a bucket
/// that lives in the flat namespace under its own name.
#[derive(Debug)]
pub(crate) enum Payload<V> {
  Value(Arc<V>),
  Bucket(BucketRecord),
}

/// One storage cell of the slot store.
///
/// A slot whose `payload` is `None` is tombstoned: it is no longer reachable
/// through the index and may be reused by the next insert.
#[derive(Debug)]
pub(crate) struct Slot<V> {
  /// The payload, or `None` once tombstoned.
  pub(crate) payload: Option<Payload<V>>,
  /// The expiration timestamp in nanoseconds since the cache epoch.
  /// `time::NEVER` means the slot never expires.
  pub(crate) expires_at: u64,
  /// The fingerprint that maps to this slot while it is live.
  pub(crate) fingerprint: u64,
}

impl<V> Slot<V> {
  pub(crate) fn new(fingerprint: u64, payload: Payload<V>, expires_at: u64) -> Self {
    Self {
      payload: Some(payload),
      expires_at,
      fingerprint,
    }
  }

  #[inline]
  pub(crate) fn is_live(&self) -> bool {
    self.payload.is_some()
  }

  #[inline]
  pub(crate) fn is_expired(&self, now: u64) -> bool {
    now >= self.expires_at
  }
}
