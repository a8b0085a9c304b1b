use crate::listener::{notify_expired, ExpirationListener};
use crate::metrics::Metrics;
use crate::store::SlotStore;
use crate::time;

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// A context object holding the thread-safe parts of the cache that the
/// janitor needs to access.
pub(crate) struct JanitorContext<V> {
  pub(crate) store: Arc<Mutex<SlotStore<V>>>,
  pub(crate) metrics: Arc<Metrics>,
  pub(crate) listener: Option<Arc<dyn ExpirationListener<V>>>,
}

/// Wakes the janitor early and tells it to exit.
#[derive(Default)]
struct StopSignal {
  stopped: Mutex<bool>,
  wakeup: Condvar,
}

/// The background task that sweeps expired slots.
pub(crate) struct Janitor {
  handle: Option<JoinHandle<()>>,
  signal: Arc<StopSignal>,
}

impl Janitor {
  /// Spawns a new janitor thread that wakes every `sweep_interval`.
  pub(crate) fn spawn<V>(context: JanitorContext<V>, sweep_interval: Duration) -> Self
  where
    V: Send + Sync + 'static,
  {
    let signal = Arc::new(StopSignal::default());
    let thread_signal = signal.clone();

    let handle = thread::spawn(move || {
      tracing::debug!(?sweep_interval, "janitor started");
      loop {
        {
          let mut stopped = thread_signal.stopped.lock();
          if !*stopped {
            thread_signal.wakeup.wait_for(&mut stopped, sweep_interval);
          }
          if *stopped {
            break;
          }
        }

        // A spurious wakeup just means an early check against `next_expiry`.
        run_sweep(&context, false);
      }
      tracing::debug!("janitor stopped");
    });

    Self {
      handle: Some(handle),
      signal,
    }
  }

  /// Signals the janitor thread to stop and waits for it to exit.
  pub(crate) fn stop(mut self) {
    *self.signal.stopped.lock() = true;
    self.signal.wakeup.notify_all();

    if let Some(handle) = self.handle.take() {
      // The last handle can be dropped from inside a listener call. Joining
      // our own thread would never return.
      if handle.thread().id() != thread::current().id() {
        let _ = handle.join();
      }
    }
  }
}

/// Sweeps the store once and delivers the expired values.
///
/// Unless `force` is set, the scan is skipped when no live slot can have
/// expired yet. The lock is released before the listener runs so that it can
/// call back into the cache. Returns the number of expired entries.
pub(crate) fn run_sweep<V>(context: &JanitorContext<V>, force: bool) -> usize {
  let (swept, expired) = {
    let mut store = context.store.lock();
    let now = time::now_nanos();
    if !force && !store.is_due(now) {
      return 0;
    }

    let swept = store.sweep(now);
    tracing::trace!(
      swept,
      live = store.len(),
      next_expiry = store.next_expiry(),
      "janitor sweep complete"
    );
    (swept, store.take_expired())
  };

  Metrics::bump(&context.metrics.sweeps, 1);
  Metrics::bump(&context.metrics.expired, expired.len() as u64);
  notify_expired(context.listener.as_ref(), expired);
  swept
}
