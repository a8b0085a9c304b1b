// This entire module is only compiled when the 'serde' feature is enabled.
#![cfg(feature = "serde")]

use crate::bucket::BucketRecord;
use crate::entry::{Payload, Slot};
use crate::error::{BuildError, PersistError};
use crate::handles::Cache;
use crate::store::SlotStore;
use crate::time::{self, NEVER};
use crate::CacheBuilder;

use std::fs::{self, OpenOptions};
use std::hash::BuildHasher;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// File mode used by `save` on Unix.
#[cfg(unix)]
const SNAPSHOT_FILE_MODE: u32 = 0o644;

/// The serializable form of a slot payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum PersistentPayload<V> {
  Value(V),
  Bucket(BucketRecord),
}

/// An internal, serializable representation of a single slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PersistentSlot<V> {
  pub(crate) fingerprint: u64,
  /// `None` for tombstoned slots.
  pub(crate) payload: Option<PersistentPayload<V>>,
  /// Remaining time to live. `None` means the slot never expires.
  pub(crate) ttl_remaining: Option<Duration>,
}

/// A serializable, point-in-time snapshot of the cache's data.
///
/// Created with [`Cache::to_snapshot()`] and turned back into a cache with
/// [`CacheBuilder::build_from_snapshot()`] or [`Cache::restore()`].
///
/// Slots keep their positions, including tombstoned ones, so bucket
/// memberships and slot reuse behave the same after a restore. Expirations
/// are stored relative to the moment the snapshot was taken.
///
/// Keys are stored only as fingerprints, so a snapshot must be restored into
/// a cache that uses the same hasher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot<V> {
  pub(crate) slots: Vec<PersistentSlot<V>>,
}

impl<V> CacheSnapshot<V> {
  /// Number of live entries in the snapshot, bucket records included.
  pub fn len(&self) -> usize {
    self.slots.iter().filter(|slot| slot.payload.is_some()).count()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Converts the snapshot back into store slots, anchoring the relative
  /// expirations at `now`.
  pub(crate) fn into_store(self, now: u64) -> SlotStore<V> {
    let slots = self
      .slots
      .into_iter()
      .map(|persistent| {
        let expires_at = match persistent.ttl_remaining {
          Some(ttl) => now.saturating_add(time::duration_to_nanos(ttl)),
          None => NEVER,
        };
        Slot {
          payload: persistent.payload.map(|payload| match payload {
            PersistentPayload::Value(value) => Payload::Value(Arc::new(value)),
            PersistentPayload::Bucket(record) => Payload::Bucket(record),
          }),
          expires_at,
          fingerprint: persistent.fingerprint,
        }
      })
      .collect();

    SlotStore::from_slots(slots)
  }
}

// --- Snapshot-based Build Method ---
impl<V, H> CacheBuilder<V, H>
where
  V: Send + Sync + 'static,
  H: BuildHasher + Send + Sync + 'static,
{
  /// Builds a new cache and pre-populates it with the slots of a snapshot.
  pub fn build_from_snapshot(self, snapshot: CacheSnapshot<V>) -> Result<Cache<V, H>, BuildError> {
    self.validate()?;
    let store = snapshot.into_store(time::now_nanos());
    let shared = self.build_shared_core(store);
    Ok(Cache { shared })
  }
}

impl<V, H> Cache<V, H>
where
  V: Clone + Serialize,
{
  /// Creates a serializable snapshot of the cache's current state.
  ///
  /// The store lock is held while the slots are copied, pausing every other
  /// cache operation. Entries that have expired but were not yet swept are
  /// written as empty slots and are not reported to the listener.
  pub fn to_snapshot(&self) -> CacheSnapshot<V> {
    let store = self.shared.store.lock();
    let now = time::now_nanos();

    let slots = store
      .slots()
      .iter()
      .map(|slot| {
        let payload = match &slot.payload {
          Some(_) if slot.is_expired(now) => None,
          Some(Payload::Value(value)) => Some(PersistentPayload::Value(value.as_ref().clone())),
          Some(Payload::Bucket(record)) => Some(PersistentPayload::Bucket(record.clone())),
          None => None,
        };
        PersistentSlot {
          fingerprint: slot.fingerprint,
          ttl_remaining: payload.as_ref().and_then(|_| time::remaining(slot.expires_at, now)),
          payload,
        }
      })
      .collect();

    CacheSnapshot { slots }
  }

  /// Writes the cache's current state to `path`, creating or truncating the
  /// file.
  ///
  /// The snapshot is encoded in memory before the file is opened, so
  /// encoding failures surface as [`PersistError::Encode`] and every file
  /// failure as [`PersistError::Io`]. The file is written in place, so a
  /// crash halfway through leaves it partially written.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
    let path = path.as_ref();
    let snapshot = self.to_snapshot();
    let bytes = bincode::serialize(&snapshot)?;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
      use std::os::unix::fs::OpenOptionsExt;
      options.mode(SNAPSHOT_FILE_MODE);
    }

    let mut file = options.open(path)?;
    file.write_all(&bytes)?;

    tracing::debug!(path = %path.display(), entries = snapshot.len(), bytes = bytes.len(), "cache saved");
    Ok(())
  }
}

impl<V, H> Cache<V, H> {
  /// Replaces the cache's in-memory state with the contents of a snapshot.
  ///
  /// Every current entry is discarded without notifying the listener. The
  /// builder settings of this cache stay in effect.
  pub fn restore(&self, snapshot: CacheSnapshot<V>) {
    let mut store = self.shared.store.lock();
    *store = snapshot.into_store(time::now_nanos());
  }
}

impl<V, H> Cache<V, H>
where
  V: DeserializeOwned,
{
  /// Replaces the cache's in-memory state with the snapshot stored at `path`
  /// by [`Cache::save`].
  ///
  /// On error the in-memory state is left untouched.
  pub fn load(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let snapshot: CacheSnapshot<V> = bincode::deserialize(&bytes)?;
    let entries = snapshot.len();

    self.restore(snapshot);
    tracing::debug!(path = %path.display(), entries, "cache loaded");
    Ok(())
  }
}
