use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// A thread-safe, internal metrics collector for the cache.
/// All fields are atomic so they can be bumped without the store lock.
#[derive(Debug)]
pub(crate) struct Metrics {
  // --- Hit/Miss Ratios ---
  pub(crate) hits: CachePadded<AtomicU64>,
  pub(crate) misses: CachePadded<AtomicU64>,

  // --- Throughput ---
  pub(crate) inserts: CachePadded<AtomicU64>,
  pub(crate) collisions: CachePadded<AtomicU64>,
  pub(crate) updates: CachePadded<AtomicU64>,
  pub(crate) extensions: CachePadded<AtomicU64>,
  pub(crate) refreshes: CachePadded<AtomicU64>,
  pub(crate) deletes: CachePadded<AtomicU64>,

  // --- Expiration ---
  pub(crate) expired: CachePadded<AtomicU64>,
  pub(crate) sweeps: CachePadded<AtomicU64>,

  created_at: Instant,
}

impl Default for Metrics {
  fn default() -> Self {
    Self {
      hits: CachePadded::new(AtomicU64::new(0)),
      misses: CachePadded::new(AtomicU64::new(0)),
      inserts: CachePadded::new(AtomicU64::new(0)),
      collisions: CachePadded::new(AtomicU64::new(0)),
      updates: CachePadded::new(AtomicU64::new(0)),
      extensions: CachePadded::new(AtomicU64::new(0)),
      refreshes: CachePadded::new(AtomicU64::new(0)),
      deletes: CachePadded::new(AtomicU64::new(0)),
      expired: CachePadded::new(AtomicU64::new(0)),
      sweeps: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub(crate) fn bump(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
  }

  /// Creates a point-in-time snapshot of the counters.
  pub(crate) fn snapshot(&self, live_entries: usize, allocated_slots: usize) -> MetricsSnapshot {
    let hits = self.hits.load(Ordering::Relaxed);
    let misses = self.misses.load(Ordering::Relaxed);
    let total_lookups = hits + misses;

    MetricsSnapshot {
      hits,
      misses,
      hit_ratio: if total_lookups == 0 {
        0.0
      } else {
        hits as f64 / total_lookups as f64
      },
      inserts: self.inserts.load(Ordering::Relaxed),
      collisions: self.collisions.load(Ordering::Relaxed),
      updates: self.updates.load(Ordering::Relaxed),
      extensions: self.extensions.load(Ordering::Relaxed),
      refreshes: self.refreshes.load(Ordering::Relaxed),
      deletes: self.deletes.load(Ordering::Relaxed),
      expired: self.expired.load(Ordering::Relaxed),
      sweeps: self.sweeps.load(Ordering::Relaxed),
      live_entries,
      allocated_slots,
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time, public-facing snapshot of the cache's metrics.
#[derive(Clone)]
pub struct MetricsSnapshot {
  /// The number of successful lookups.
  pub hits: u64,
  /// The number of failed lookups.
  pub misses: u64,
  /// The cache hit ratio (hits / (hits + misses)).
  pub hit_ratio: f64,
  /// The number of successful inserts.
  pub inserts: u64,
  /// The number of inserts rejected because the key was live.
  pub collisions: u64,
  /// The number of in-place value updates.
  pub updates: u64,
  /// The number of explicit expiration extensions.
  pub extensions: u64,
  /// The number of expirations pushed out by refresh on access.
  pub refreshes: u64,
  /// The number of explicit deletions.
  pub deletes: u64,
  /// The number of entries that expired, whether swept or found lazily.
  pub expired: u64,
  /// The number of full slot scans performed.
  pub sweeps: u64,
  /// Live entries, bucket records included.
  pub live_entries: usize,
  /// Slots allocated so far, live or tombstoned.
  pub allocated_slots: usize,
  /// The number of seconds the cache has been running.
  pub uptime_secs: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("hit_ratio", &format!("{:.2}%", self.hit_ratio * 100.0))
      .field("inserts", &self.inserts)
      .field("collisions", &self.collisions)
      .field("updates", &self.updates)
      .field("extensions", &self.extensions)
      .field("refreshes", &self.refreshes)
      .field("deletes", &self.deletes)
      .field("expired", &self.expired)
      .field("sweeps", &self.sweeps)
      .field("live_entries", &self.live_entries)
      .field("allocated_slots", &self.allocated_slots)
      .field("uptime_secs", &self.uptime_secs)
      .finish()
  }
}
