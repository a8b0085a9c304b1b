use thiserror::Error;

/// Errors returned by cache and bucket operations.
///
/// Both `Collision` and `NotFound` are final answers for the call that
/// produced them. The cache never retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
  /// An insert targeted a key that already has a live entry.
  #[error("hash collision: key already has a live entry")]
  Collision,
  /// The key has no live entry. This covers keys that never existed, deleted
  /// keys and keys that were found to be expired.
  #[error("key does not exist")]
  NotFound,
  /// A bucket name contained the reserved namespace separator.
  #[error("invalid bucket name {0:?}: names may not contain a NUL byte")]
  InvalidBucketName(String),
}

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// The janitor cannot run with a zero sweep interval.
  #[error("sweep interval cannot be zero")]
  ZeroSweepInterval,
  /// Refresh on access was enabled with a zero refresh duration.
  #[error("refresh duration cannot be zero when refresh on access is enabled")]
  ZeroRefreshDuration,
}

/// Errors raised while saving or loading a cache.
#[cfg(feature = "serde")]
#[derive(Debug, Error)]
pub enum PersistError {
  #[error("failed to access cache file: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to encode or decode cache snapshot: {0}")]
  Encode(#[from] bincode::Error),
}
