use fibre_ttlcache::{Cache, CacheBuilder, CacheError, ExpirationListener};
use std::{
  sync::{mpsc, Arc, Mutex},
  thread,
  time::Duration,
};

mod common;
use common::{JANITOR_TICK, SLEEP_MARGIN, TINY_TTL};

// Use std::sync::mpsc for synchronous tests. It's simpler and clearer.
struct TestListener {
  sender: mpsc::Sender<Arc<String>>,
}

impl ExpirationListener<String> for TestListener {
  fn on_expire(&self, value: Arc<String>) {
    // The janitor holds no cache lock while calling us, so blocking is fine.
    self.sender.send(value).unwrap();
  }
}

#[test]
fn test_sync_listener_receives_expired_values() {
  let (tx, rx) = mpsc::channel();
  let cache = CacheBuilder::<String>::default()
    .sweep_interval(JANITOR_TICK)
    .on_expires(TestListener { sender: tx })
    .build()
    .unwrap();

  cache.add("one", "1".to_string(), TINY_TTL).unwrap();
  cache.add("two", "2".to_string(), TINY_TTL * 2).unwrap();

  let mut received = vec![
    rx.recv_timeout(Duration::from_secs(2)).unwrap(),
    rx.recv_timeout(Duration::from_secs(2)).unwrap(),
  ];
  received.sort();
  assert_eq!(*received[0], "1");
  assert_eq!(*received[1], "2");
}

#[test]
fn test_sync_listener_not_called_for_delete() {
  let (cache, rx) = common::fast_cache_with_listener::<i32>();

  cache.add("key", 1, TINY_TTL).unwrap();
  cache.delete("key").unwrap();

  thread::sleep(TINY_TTL + SLEEP_MARGIN);
  assert!(rx.try_recv().is_err());
}

#[test]
fn test_sync_listener_not_called_for_buckets() {
  let (cache, rx) = common::fast_cache_with_listener::<i32>();
  let bucket = cache.bucket("b").unwrap();
  bucket.add("x", 1, TINY_TTL).unwrap();

  assert_eq!(*rx.recv_timeout(Duration::from_secs(2)).unwrap(), 1);
  assert!(
    rx.recv_timeout(Duration::from_millis(100)).is_err(),
    "Only the member value expires, never the bucket record"
  );
  assert!(bucket.iter().next().is_none());
  assert_eq!(bucket.len(), 1, "Membership is kept until pruned");
}

#[test]
fn test_sync_listener_panic_does_not_kill_janitor() {
  common::init_tracing();

  let seen = Arc::new(Mutex::new(Vec::new()));
  let seen_clone = seen.clone();
  let cache = CacheBuilder::<i32>::default()
    .sweep_interval(JANITOR_TICK)
    .on_expires(move |value: Arc<i32>| {
      if *value == 1 {
        panic!("listener failure");
      }
      seen_clone.lock().unwrap().push(*value);
    })
    .build()
    .unwrap();

  cache.add("a", 1, Duration::from_millis(20)).unwrap();
  cache.add("b", 2, Duration::from_millis(20)).unwrap();
  thread::sleep(Duration::from_millis(20) + SLEEP_MARGIN);

  cache.add("c", 3, Duration::from_millis(20)).unwrap();
  thread::sleep(Duration::from_millis(20) + SLEEP_MARGIN);

  let mut seen = seen.lock().unwrap().clone();
  seen.sort();
  assert_eq!(seen, vec![2, 3]);
  assert_eq!(cache.metrics().expired, 3);
}

#[test]
fn test_sync_listener_can_reenter_cache() {
  // The listener writes every expired value back under a new key.
  let slot: Arc<Mutex<Option<Cache<i32>>>> = Arc::new(Mutex::new(None));
  let slot_clone = slot.clone();
  let cache = CacheBuilder::<i32>::default()
    .sweep_interval(JANITOR_TICK)
    .on_expires(move |value: Arc<i32>| {
      if let Some(cache) = slot_clone.lock().unwrap().as_ref() {
        let _ = cache.add(&format!("expired-{value}"), *value, Duration::ZERO);
        let _ = cache.get("missing");
      }
    })
    .build()
    .unwrap();
  *slot.lock().unwrap() = Some(cache.clone());

  cache.add("key", 7, TINY_TTL).unwrap();
  thread::sleep(TINY_TTL + SLEEP_MARGIN);

  assert_eq!(cache.get("key"), Err(CacheError::NotFound));
  assert_eq!(*cache.get("expired-7").unwrap(), 7);

  // Break the listener -> cache cycle so the janitor can shut down.
  slot.lock().unwrap().take();
}

#[test]
fn test_sync_dropping_cache_stops_janitor() {
  let marker = Arc::new(());
  let marker_clone = marker.clone();
  let cache = CacheBuilder::<i32>::default()
    .sweep_interval(JANITOR_TICK)
    .on_expires(move |_: Arc<i32>| {
      let _ = &marker_clone;
    })
    .build()
    .unwrap();
  let bucket = cache.bucket("b").unwrap();
  assert_eq!(Arc::strong_count(&marker), 2);

  drop(cache);
  assert_eq!(Arc::strong_count(&marker), 2, "The bucket keeps the cache alive");
  bucket.add("x", 1, TINY_TTL).unwrap();

  drop(bucket);
  assert_eq!(
    Arc::strong_count(&marker),
    1,
    "Janitor and listener are released with the last handle"
  );
}
