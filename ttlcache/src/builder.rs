use crate::error::BuildError;
use crate::handles::Cache;
use crate::hash::RapidBuildHasher;
use crate::metrics::Metrics;
use crate::shared::CacheShared;
use crate::store::SlotStore;
use crate::task::janitor::{Janitor, JanitorContext};
use crate::ExpirationListener;

use core::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// How often the janitor wakes up unless configured otherwise.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// How far a hit pushes an entry's expiration out when refresh on access is
/// enabled and no duration was configured.
pub const DEFAULT_REFRESH_DURATION: Duration = Duration::from_secs(1);

/// A builder for creating `Cache` instances.
pub struct CacheBuilder<V, H = RapidBuildHasher> {
  pub(crate) refresh_on_access: bool,
  pub(crate) refresh_duration: Duration,
  pub(crate) sweep_interval: Duration,
  pub(crate) hasher: H,
  listener: Option<Arc<dyn ExpirationListener<V>>>,
}

// Manual Debug implementation for CacheBuilder.
impl<V, H> fmt::Debug for CacheBuilder<V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("refresh_on_access", &self.refresh_on_access)
      .field("refresh_duration", &self.refresh_duration)
      .field("sweep_interval", &self.sweep_interval)
      .field("has_listener", &self.listener.is_some())
      .finish_non_exhaustive()
  }
}

// --- General Configuration Methods ---
impl<V, H> CacheBuilder<V, H> {
  /// Sets the listener that receives the value of every expired entry.
  ///
  /// Closures of the form `Fn(Arc<V>)` can be passed directly.
  pub fn on_expires<Listener>(mut self, listener: Listener) -> Self
  where
    Listener: ExpirationListener<V> + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  /// Makes every successful `get` push the entry's expiration out by the
  /// refresh duration, so entries that are read often stay alive.
  pub fn refresh_on_access(mut self, enabled: bool) -> Self {
    self.refresh_on_access = enabled;
    self
  }

  /// Sets how far a hit pushes an entry's expiration out. Only used when
  /// refresh on access is enabled.
  ///
  /// Defaults to `1 second`.
  pub fn refresh_duration(mut self, duration: Duration) -> Self {
    self.refresh_duration = duration;
    self
  }

  /// Sets how often the janitor wakes up to look for expired entries.
  ///
  /// Defaults to `10 seconds`.
  pub fn sweep_interval(mut self, duration: Duration) -> Self {
    self.sweep_interval = duration;
    self
  }

  /// Sets the hasher used to fingerprint keys.
  ///
  /// Fingerprints are persisted by `save`, so the hasher must produce the
  /// same output in the process that later calls `load`.
  pub fn hasher(mut self, hasher: H) -> Self {
    self.hasher = hasher;
    self
  }
}

// --- Default Constructor ---
impl<V, H: BuildHasher + Default> CacheBuilder<V, H> {
  /// Creates a new `CacheBuilder` with default settings.
  pub fn new() -> Self {
    Self {
      refresh_on_access: false,
      refresh_duration: DEFAULT_REFRESH_DURATION,
      sweep_interval: DEFAULT_SWEEP_INTERVAL,
      hasher: H::default(),
      listener: None,
    }
  }
}

impl<V> Default for CacheBuilder<V, RapidBuildHasher> {
  fn default() -> Self {
    Self::new()
  }
}

// --- Build Methods ---
impl<V, H> CacheBuilder<V, H>
where
  V: Send + Sync + 'static,
  H: BuildHasher + Send + Sync + 'static,
{
  /// Builds a `Cache` and starts its janitor.
  pub fn build(self) -> Result<Cache<V, H>, BuildError> {
    self.validate()?;
    let shared = self.build_shared_core(SlotStore::new());
    Ok(Cache { shared })
  }

  /// Central logic to construct the shared core of the cache around `store`.
  pub(crate) fn build_shared_core(self, store: SlotStore<V>) -> Arc<CacheShared<V, H>> {
    let store = Arc::new(Mutex::new(store));
    let metrics = Arc::new(Metrics::new());
    let refresh = self.refresh_on_access.then_some(self.refresh_duration);

    let janitor_context = JanitorContext {
      store: Arc::clone(&store),
      metrics: Arc::clone(&metrics),
      listener: self.listener.clone(),
    };
    let janitor = Janitor::spawn(janitor_context, self.sweep_interval);

    tracing::debug!(
      sweep_interval = ?self.sweep_interval,
      refresh = ?refresh,
      has_listener = self.listener.is_some(),
      "cache built"
    );

    Arc::new(CacheShared {
      store,
      hasher: self.hasher,
      metrics,
      listener: self.listener,
      refresh,
      sweep_interval: self.sweep_interval,
      janitor: Some(janitor),
    })
  }

  /// Validates the builder configuration.
  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    if self.sweep_interval.is_zero() {
      return Err(BuildError::ZeroSweepInterval);
    }
    if self.refresh_on_access && self.refresh_duration.is_zero() {
      return Err(BuildError::ZeroRefreshDuration);
    }
    Ok(())
  }
}
