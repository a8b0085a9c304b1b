use fibre_ttlcache::{CacheBuilder, CacheError};
use pretty_assertions::assert_eq;
use std::time::Duration;

mod common;

const MINUTE: Duration = Duration::from_secs(60);

#[test]
fn test_sync_missing_key_is_not_found() {
  let cache = CacheBuilder::<i32>::default().build().unwrap();

  assert_eq!(cache.get("nope"), Err(CacheError::NotFound));
  assert_eq!(cache.delete("nope"), Err(CacheError::NotFound));
  assert_eq!(cache.update("nope", 1), Err(CacheError::NotFound));
  assert_eq!(cache.extend("nope", MINUTE), Err(CacheError::NotFound));
  assert!(!cache.contains("nope"));

  let metrics = cache.metrics();
  assert_eq!(metrics.misses, 1);
  assert_eq!(metrics.hits, 0);
}

#[test]
fn test_sync_add_and_get() {
  let cache = CacheBuilder::<String>::default().build().unwrap();
  cache.add("key1", "one".to_string(), MINUTE).unwrap();

  assert_eq!(*cache.get("key1").unwrap(), "one");
  assert!(cache.contains("key1"));
  assert_eq!(cache.len(), 1);

  let metrics = cache.metrics();
  assert_eq!(metrics.inserts, 1);
  assert_eq!(metrics.hits, 1);
  assert_eq!(metrics.live_entries, 1);
}

#[test]
fn test_sync_add_twice_is_a_collision() {
  let cache = CacheBuilder::<i32>::default().build().unwrap();
  cache.add("key", 1, MINUTE).unwrap();

  assert_eq!(cache.add("key", 2, MINUTE), Err(CacheError::Collision));
  assert_eq!(*cache.get("key").unwrap(), 1, "First value must survive");
  assert_eq!(cache.metrics().collisions, 1);
}

#[test]
fn test_sync_delete_then_get() {
  let cache = CacheBuilder::<i32>::default().build().unwrap();
  cache.add("key", 1, MINUTE).unwrap();

  cache.delete("key").unwrap();
  assert_eq!(cache.get("key"), Err(CacheError::NotFound));
  assert_eq!(
    cache.delete("key"),
    Err(CacheError::NotFound),
    "Double delete should fail"
  );
  assert!(cache.is_empty());
  assert_eq!(cache.metrics().deletes, 1);
}

#[test]
fn test_sync_update_replaces_value() {
  let cache = CacheBuilder::<i32>::default().build().unwrap();
  cache.add("key", 1, MINUTE).unwrap();

  cache.update("key", 2).unwrap();
  assert_eq!(*cache.get("key").unwrap(), 2);
  assert_eq!(cache.metrics().updates, 1);
}

#[test]
fn test_sync_readers_keep_old_value_after_update() {
  let cache = CacheBuilder::<String>::default().build().unwrap();
  cache.add("key", "old".to_string(), MINUTE).unwrap();

  let held = cache.get("key").unwrap();
  cache.update("key", "new".to_string()).unwrap();

  assert_eq!(*held, "old");
  assert_eq!(*cache.get("key").unwrap(), "new");
}

#[test]
fn test_sync_deleted_slots_are_reused() {
  let cache = CacheBuilder::<i32>::default().build().unwrap();
  for i in 0..8 {
    cache.add(&format!("key{i}"), i, MINUTE).unwrap();
  }
  assert_eq!(cache.metrics().allocated_slots, 8);

  for round in 0..10 {
    for i in 0..8 {
      let key = format!("key{i}");
      cache.delete(&key).unwrap();
      cache.add(&key, i + round, MINUTE).unwrap();
    }
  }

  let metrics = cache.metrics();
  assert_eq!(metrics.allocated_slots, 8, "Churn must not grow the store");
  assert_eq!(metrics.live_entries, 8);
  assert_eq!(*cache.get("key3").unwrap(), 12);
}

#[test]
fn test_sync_clear_removes_everything() {
  let (cache, rx) = common::fast_cache_with_listener::<i32>();
  cache.add("a", 1, MINUTE).unwrap();
  let bucket = cache.bucket("b").unwrap();
  bucket.add("x", 2, MINUTE).unwrap();

  cache.clear();

  assert!(cache.is_empty());
  assert_eq!(cache.get("a"), Err(CacheError::NotFound));
  assert_eq!(bucket.get("x"), Err(CacheError::NotFound));
  assert!(
    rx.recv_timeout(Duration::from_millis(100)).is_err(),
    "Clear must not notify the listener"
  );
}

#[test]
fn test_sync_clones_share_state() {
  let cache = CacheBuilder::<i32>::default().build().unwrap();
  let other = cache.clone();

  cache.add("key", 7, MINUTE).unwrap();
  assert_eq!(*other.get("key").unwrap(), 7);
  other.delete("key").unwrap();
  assert!(!cache.contains("key"));
}

#[test]
fn test_sync_debug_output_does_not_deadlock() {
  let cache = CacheBuilder::<i32>::default().build().unwrap();
  cache.add("key", 1, MINUTE).unwrap();
  let rendered = format!("{cache:?}");
  assert!(rendered.contains("SlotStore"));
}
