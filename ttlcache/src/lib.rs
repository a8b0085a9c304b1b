//! An in-process, thread-safe key/value cache with per-entry expiration.
//!
//! # Features
//! - **Per-entry TTL**: Every entry carries its own time to live; a zero TTL
//!   means the entry never expires.
//! - **Background Janitor**: A janitor thread sweeps expired entries on a
//!   fixed interval and reports them to an optional expiration listener.
//! - **Buckets**: Named partitions of the key space that remember which keys
//!   were added through them and can be walked with a cursor.
//! - **Slot Reuse**: Deleted and expired slots are recycled, so the store
//!   does not grow with churn.
//! - **Observability**: Exposes hit/miss and expiration counters.
//! - **Persistence**: Optional `serde` feature for saving and loading cache
//!   state.
//!
//! # Example
//! ```
//! use fibre_ttlcache::{CacheBuilder, CacheError};
//! use std::time::Duration;
//!
//! let cache = CacheBuilder::<String>::default().build().unwrap();
//! cache.add("greeting", "hello".to_string(), Duration::from_secs(60)).unwrap();
//!
//! assert_eq!(*cache.get("greeting").unwrap(), "hello");
//! assert_eq!(
//!   cache.add("greeting", "again".to_string(), Duration::ZERO),
//!   Err(CacheError::Collision)
//! );
//! ```

// Public modules that form the API
pub mod bucket;
pub mod builder;
pub mod error;
pub mod handles;
pub mod hash;
pub mod iter;
pub mod listener;
pub mod metrics;

// Internal, crate-only modules
mod entry;
mod shared;
mod store;
mod task;
mod time;

#[cfg(feature = "serde")]
pub mod snapshot;

// Re-export the primary user-facing types for convenience
pub use bucket::Bucket;
pub use builder::CacheBuilder;
pub use error::{BuildError, CacheError};
pub use handles::Cache;
pub use hash::RapidBuildHasher;
pub use iter::BucketIter;
pub use listener::ExpirationListener;
pub use metrics::MetricsSnapshot;

#[cfg(feature = "serde")]
pub use error::PersistError;
#[cfg(feature = "serde")]
pub use snapshot::CacheSnapshot;
