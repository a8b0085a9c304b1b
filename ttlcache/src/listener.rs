use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A listener that can be registered with the cache to receive the values of
/// entries that expire.
///
/// It is called once per expired entry, with only the entry's value. The key
/// is not passed along, so values that need to be told apart should carry
/// their own identification.
///
/// Calls never happen while the cache lock is held, so a listener may call
/// back into the cache. Entries swept by the janitor are reported on the
/// janitor thread; entries found expired by a lookup are reported on the
/// thread that performed the lookup, once it has released the lock.
///
/// Any `Fn(Arc<V>) + Send + Sync` closure is a listener.
pub trait ExpirationListener<V>: Send + Sync {
  fn on_expire(&self, value: Arc<V>);
}

impl<V, F> ExpirationListener<V> for F
where
  F: Fn(Arc<V>) + Send + Sync,
{
  fn on_expire(&self, value: Arc<V>) {
    self(value)
  }
}

/// Hands expired values to the listener, if any. A panicking listener is
/// logged and skipped so the remaining values are still delivered.
pub(crate) fn notify_expired<V>(listener: Option<&Arc<dyn ExpirationListener<V>>>, values: Vec<Arc<V>>) {
  let Some(listener) = listener else {
    return;
  };

  for value in values {
    if panic::catch_unwind(AssertUnwindSafe(|| listener.on_expire(value))).is_err() {
      tracing::error!("expiration listener panicked; continuing with the remaining entries");
    }
  }
}
