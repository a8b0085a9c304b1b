use fibre_ttlcache::CacheBuilder;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let path = std::env::temp_dir().join("fibre_ttlcache_example.bin");

  let cache = CacheBuilder::<String>::default().build()?;
  cache.add("session", "abc123".to_string(), Duration::from_secs(300))?;
  cache.bucket("users")?.add("42", "Ada".to_string(), Duration::ZERO)?;
  cache.save(&path)?;
  println!("Saved {} entries to {}", cache.len(), path.display());

  let restored = CacheBuilder::<String>::default().build()?;
  restored.load(&path)?;
  println!("session = {}", restored.get("session")?);
  println!("users/42 = {}", restored.bucket("users")?.get("42")?);

  std::fs::remove_file(&path)?;
  Ok(())
}
