use fibre_ttlcache::CacheBuilder;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
  // Create a cache whose janitor sweeps every second and that reports
  // expired values.
  let cache = CacheBuilder::default()
    .sweep_interval(Duration::from_secs(1))
    .on_expires(|value: Arc<i32>| println!("Expired: {}", value))
    .build()
    .expect("Failed to build cache");

  println!("Adding ('key1', 100) with a 3-second TTL.");
  cache
    .add("key1", 100, Duration::from_secs(3))
    .expect("key1 should be new");

  match cache.get("key1") {
    Ok(value) => println!("Found value for key1: {}", value),
    Err(err) => println!("Lookup failed: {}", err),
  }

  println!("\nCache metrics: {:#?}", cache.metrics());

  println!("\nWaiting 4 seconds for the item to expire...");
  thread::sleep(Duration::from_secs(4));

  // The janitor runs every second and will have removed the expired item.
  match cache.get("key1") {
    Ok(value) => println!("Found value for key1: {}", value),
    Err(err) => println!("Lookup failed (as expected after TTL): {}", err),
  }

  println!("\nCache metrics after expiration: {:#?}", cache.metrics());
}
