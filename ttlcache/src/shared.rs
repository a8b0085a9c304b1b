use crate::error::CacheError;
use crate::hash;
use crate::listener::{notify_expired, ExpirationListener};
use crate::metrics::Metrics;
use crate::store::SlotStore;
use crate::task::janitor::{self, Janitor, JanitorContext};
use crate::time;

use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// The internal, thread-safe core of the cache, shared by every `Cache`,
/// `Bucket` and `BucketIter` handle.
pub(crate) struct CacheShared<V, H> {
  /// The slot store behind the single store-wide lock.
  pub(crate) store: Arc<Mutex<SlotStore<V>>>,
  pub(crate) hasher: H,
  pub(crate) metrics: Arc<Metrics>,
  pub(crate) listener: Option<Arc<dyn ExpirationListener<V>>>,
  /// How far a hit pushes an entry's expiration out, if refresh on access
  /// is enabled.
  pub(crate) refresh: Option<Duration>,
  pub(crate) sweep_interval: Duration,
  pub(crate) janitor: Option<Janitor>,
}

impl<V, H> fmt::Debug for CacheShared<V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheShared")
      .field("store", &*self.store.lock())
      .field("refresh", &self.refresh)
      .field("sweep_interval", &self.sweep_interval)
      .field("has_listener", &self.listener.is_some())
      .finish_non_exhaustive()
  }
}

impl<V, H> Drop for CacheShared<V, H> {
  fn drop(&mut self) {
    if let Some(janitor) = self.janitor.take() {
      janitor.stop();
    }
  }
}

impl<V, H: BuildHasher> CacheShared<V, H> {
  #[inline]
  pub(crate) fn fingerprint(&self, namespace: Option<&str>, key: &str) -> u64 {
    hash::fingerprint(&self.hasher, namespace, key)
  }
}

impl<V, H> CacheShared<V, H> {
  /// Runs `f` against the locked store with the current time.
  ///
  /// Entries that `f` found expired are handed to the listener after the
  /// lock has been released.
  pub(crate) fn with_store<R>(&self, f: impl FnOnce(&mut SlotStore<V>, u64) -> R) -> R {
    let (result, expired) = {
      let mut store = self.store.lock();
      let now = time::now_nanos();
      let result = f(&mut *store, now);
      (result, store.take_expired())
    };

    if !expired.is_empty() {
      Metrics::bump(&self.metrics.expired, expired.len() as u64);
      notify_expired(self.listener.as_ref(), expired);
    }

    result
  }

  /// Records the outcome of an insert.
  #[inline]
  pub(crate) fn record_insert(&self, result: &Result<(), CacheError>) {
    match result {
      Ok(()) => Metrics::bump(&self.metrics.inserts, 1),
      Err(CacheError::Collision) => Metrics::bump(&self.metrics.collisions, 1),
      Err(_) => {}
    }
  }

  /// Records the outcome of a value lookup.
  #[inline]
  pub(crate) fn record_lookup(&self, hit: bool) {
    if hit {
      Metrics::bump(&self.metrics.hits, 1);
      if self.refresh.is_some() {
        Metrics::bump(&self.metrics.refreshes, 1);
      }
    } else {
      Metrics::bump(&self.metrics.misses, 1);
    }
  }

  /// Runs one unconditional sweep on the calling thread.
  pub(crate) fn sweep_now(&self) -> usize {
    let context = JanitorContext {
      store: Arc::clone(&self.store),
      metrics: Arc::clone(&self.metrics),
      listener: self.listener.clone(),
    };
    janitor::run_sweep(&context, true)
  }
}
