use fibre_ttlcache::CacheBuilder;
use std::time::Duration;

fn main() {
  let cache = CacheBuilder::<u32>::default()
    .build()
    .expect("Failed to build cache");

  // A bucket is a named group of keys inside the same cache.
  let scores = cache.bucket("scores").expect("bucket name is valid");
  scores.add("alice", 10, Duration::ZERO).unwrap();
  scores.add("bob", 7, Duration::from_secs(60)).unwrap();

  // Bucket keys never clash with flat keys of the same name.
  cache.add("alice", 1, Duration::ZERO).unwrap();

  // Walk the bucket in insertion order, doubling every score in place.
  let mut cursor = scores.iter();
  while cursor.advance() {
    if let Some(score) = cursor.item() {
      cursor.update(*score * 2).unwrap();
    }
  }

  for score in scores.iter() {
    println!("score: {}", score);
  }
  println!("flat alice: {}", cache.get("alice").unwrap());
  println!("bucket members: {}", scores.len());
}
