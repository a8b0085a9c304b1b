use fibre_ttlcache::{CacheBuilder, CacheError};
use std::{thread, time::Duration};

mod common;
use common::{JANITOR_TICK, SLEEP_MARGIN, TINY_TTL};

#[test]
fn test_sync_item_expires_after_ttl() {
  let (cache, rx) = common::fast_cache_with_listener::<i32>();

  cache.add("key", 42, TINY_TTL).unwrap();
  assert_eq!(*cache.get("key").unwrap(), 42);

  thread::sleep(TINY_TTL + JANITOR_TICK + SLEEP_MARGIN);
  assert_eq!(cache.get("key"), Err(CacheError::NotFound));

  let expired = rx.recv_timeout(Duration::from_secs(1)).unwrap();
  assert_eq!(*expired, 42);
  assert!(
    rx.recv_timeout(Duration::from_millis(100)).is_err(),
    "Listener must fire exactly once"
  );

  let metrics = cache.metrics();
  assert_eq!(metrics.expired, 1);
  assert!(metrics.sweeps >= 1);
  assert_eq!(metrics.live_entries, 0);
}

#[test]
fn test_sync_lookup_expires_without_janitor() {
  // The janitor is effectively parked, so only the lookup can expire it.
  let (tx, rx) = std::sync::mpsc::channel();
  let cache = CacheBuilder::<i32>::default()
    .sweep_interval(Duration::from_secs(3600))
    .on_expires(move |value: std::sync::Arc<i32>| {
      let _ = tx.send(value);
    })
    .build()
    .unwrap();

  cache.add("key", 5, TINY_TTL).unwrap();
  thread::sleep(TINY_TTL + SLEEP_MARGIN);

  assert_eq!(cache.len(), 1, "Not swept yet");
  assert_eq!(cache.get("key"), Err(CacheError::NotFound));
  assert_eq!(cache.len(), 0);
  assert_eq!(*rx.try_recv().unwrap(), 5, "Delivered on the calling thread");
}

#[test]
fn test_sync_zero_ttl_never_expires() {
  let cache = common::fast_cache::<i32>();
  cache.add("forever", 1, Duration::ZERO).unwrap();

  thread::sleep(SLEEP_MARGIN);
  assert_eq!(cache.run_pending_expirations(), 0);
  assert_eq!(*cache.get("forever").unwrap(), 1);
}

#[test]
fn test_sync_extend_pushes_expiration_out() {
  let cache = common::fast_cache::<i32>();
  cache.add("key", 1, TINY_TTL).unwrap();
  cache.extend("key", Duration::from_secs(60)).unwrap();

  thread::sleep(TINY_TTL + SLEEP_MARGIN);
  assert_eq!(*cache.get("key").unwrap(), 1);
  assert_eq!(cache.metrics().extensions, 1);
}

#[test]
fn test_sync_ttl_is_not_reset_on_access_by_default() {
  let cache = common::fast_cache::<&str>();

  cache.add("key", "value", TINY_TTL).unwrap();
  thread::sleep(TINY_TTL / 2);
  assert!(cache.get("key").is_ok());
  thread::sleep(TINY_TTL / 2 + SLEEP_MARGIN);
  assert_eq!(
    cache.get("key"),
    Err(CacheError::NotFound),
    "Item should have expired despite access"
  );
}

#[test]
fn test_sync_refresh_on_access_keeps_entry_alive() {
  let ttl = Duration::from_millis(150);
  let cache = CacheBuilder::<&str>::default()
    .sweep_interval(JANITOR_TICK)
    .refresh_on_access(true)
    .refresh_duration(ttl)
    .build()
    .unwrap();

  cache.add("hot", "value", ttl).unwrap();
  for _ in 0..4 {
    thread::sleep(ttl / 2);
    assert!(cache.get("hot").is_ok(), "Reads should keep the entry alive");
  }

  let metrics = cache.metrics();
  assert_eq!(metrics.refreshes, 4);
  assert_eq!(metrics.expired, 0);
}

#[test]
fn test_sync_expired_key_can_be_added_again() {
  let cache = common::fast_cache::<i32>();
  cache.add("key", 1, TINY_TTL).unwrap();
  thread::sleep(TINY_TTL + SLEEP_MARGIN);

  cache.add("key", 2, Duration::ZERO).unwrap();
  assert_eq!(*cache.get("key").unwrap(), 2);
}

#[test]
fn test_sync_run_pending_expirations() {
  let cache = CacheBuilder::<i32>::default()
    .sweep_interval(Duration::from_secs(3600))
    .build()
    .unwrap();
  cache.add("a", 1, Duration::from_millis(20)).unwrap();
  cache.add("b", 2, Duration::from_millis(20)).unwrap();
  cache.add("c", 3, Duration::ZERO).unwrap();

  thread::sleep(Duration::from_millis(20) + SLEEP_MARGIN);
  assert_eq!(cache.run_pending_expirations(), 2);
  assert_eq!(cache.len(), 1);
  assert_eq!(cache.metrics().expired, 2);
}
