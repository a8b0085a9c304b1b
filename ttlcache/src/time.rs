use once_cell::sync::Lazy;
use std::time::{Duration, Instant};

// The single, static reference point for all expiration timestamps.
// It is initialized lazily on its first use.
static CACHE_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Timestamp value for entries that never expire.
pub(crate) const NEVER: u64 = u64::MAX;

/// Returns the current time in nanoseconds since the cache epoch.
#[inline]
pub(crate) fn now_nanos() -> u64 {
  duration_to_nanos(Instant::now().saturating_duration_since(*CACHE_EPOCH))
}

/// Saturating conversion of a `Duration` into nanoseconds.
#[inline]
pub(crate) fn duration_to_nanos(duration: Duration) -> u64 {
  u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Computes the absolute expiration for an entry inserted at `now`.
/// A zero `ttl` means the entry never expires.
#[inline]
pub(crate) fn expires_at(now: u64, ttl: Duration) -> u64 {
  if ttl.is_zero() {
    NEVER
  } else {
    now.saturating_add(duration_to_nanos(ttl))
  }
}

/// Pushes an absolute expiration further out. `NEVER` stays `NEVER`.
#[inline]
pub(crate) fn extend(expires_at: u64, delta: Duration) -> u64 {
  expires_at.saturating_add(duration_to_nanos(delta))
}

/// Returns the time left until `expires_at`, or `None` for entries that
/// never expire. Already-expired entries report a zero duration.
#[inline]
#[cfg_attr(not(feature = "serde"), allow(dead_code))]
pub(crate) fn remaining(expires_at: u64, now: u64) -> Option<Duration> {
  if expires_at == NEVER {
    None
  } else {
    Some(Duration::from_nanos(expires_at.saturating_sub(now)))
  }
}
