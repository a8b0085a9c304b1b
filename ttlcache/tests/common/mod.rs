#![allow(dead_code)]

use std::hash::{BuildHasher, Hasher};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use fibre_ttlcache::{Cache, CacheBuilder};

/// Janitor interval used by tests that wait for sweeps.
pub const JANITOR_TICK: Duration = Duration::from_millis(10);
pub const TINY_TTL: Duration = Duration::from_millis(100);
pub const SLEEP_MARGIN: Duration = Duration::from_millis(150);

/// Installs a `tracing` subscriber that writes through the test harness.
/// Safe to call from every test.
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

/// A cache whose janitor runs every `JANITOR_TICK`.
pub fn fast_cache<V: Send + Sync + 'static>() -> Cache<V> {
  CacheBuilder::<V>::default()
    .sweep_interval(JANITOR_TICK)
    .build()
    .unwrap()
}

/// A fast-sweeping cache that forwards every expired value to the returned
/// receiver.
pub fn fast_cache_with_listener<V: Send + Sync + 'static>() -> (Cache<V>, mpsc::Receiver<Arc<V>>) {
  let (tx, rx) = mpsc::channel();
  let cache = CacheBuilder::<V>::default()
    .sweep_interval(JANITOR_TICK)
    .on_expires(move |value: Arc<V>| {
      let _ = tx.send(value);
    })
    .build()
    .unwrap();
  (cache, rx)
}

// A hasher that maps every key to the same fingerprint, to force collisions
// between otherwise unrelated keys.
#[derive(Clone, Default)]
pub struct ConstantState;

impl BuildHasher for ConstantState {
  type Hasher = ConstantHasher;
  fn build_hasher(&self) -> Self::Hasher {
    ConstantHasher
  }
}

pub struct ConstantHasher;

impl Hasher for ConstantHasher {
  fn finish(&self) -> u64 {
    42
  }
  fn write(&mut self, _: &[u8]) {}
}
