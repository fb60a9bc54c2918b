//! TTL cache with single-flight producers and bounded FIFO eviction
//!
//! The resolver stores discovery documents, keysets, and resolved keys in one
//! of these, keyed by opaque strings. The cache itself performs no I/O: all
//! network access happens inside the producer futures handed to [`TtlCache::get`].
//!
//! Concurrency model: the map is guarded by a mutex and entry creation happens
//! under the lock, so two parallel callers for the same key can never start
//! two producers. The producer itself is a [`Shared`] future; every caller
//! awaits a clone of the same allocation, which also keeps an in-flight
//! producer alive for the remaining waiters when one caller is cancelled or
//! the entry is evicted mid-flight.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

/// Delay between an insert and the sweep it schedules. Inserts landing inside
/// the window share a single sweep.
const SWEEP_DEBOUNCE: Duration = Duration::from_millis(100);

type SharedValue<T> = Shared<BoxFuture<'static, Option<T>>>;

/// One cache slot: a shared producer future plus its expiration.
///
/// `expiration` stays unset while the producer is in flight. A pending entry
/// is never considered expired, so late callers join the producer instead of
/// starting a second one.
struct Entry<T: Clone> {
    expiration: Arc<Mutex<Option<Instant>>>,
    value: SharedValue<T>,
}

impl<T: Clone> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            expiration: Arc::clone(&self.expiration),
            value: self.value.clone(),
        }
    }
}

/// Result of a cache lookup
pub(crate) struct Lookup<T: Clone> {
    /// The entry's value; resolves to `None` when the producer reported absence
    pub value: SharedValue<T>,
    /// Whether the lookup reused an existing entry (completed or in flight)
    pub cached: bool,
}

struct CacheState<T: Clone> {
    entries: HashMap<String, Entry<T>>,
    /// Insertion order for FIFO eviction. Replacing a key moves it to the back.
    order: VecDeque<String>,
}

/// String-keyed TTL cache with single-flight producers.
///
/// Successful producer results live for the per-call `ttl`; absent results
/// (`None`) live for the shorter `retry_delay` so temporarily unreachable
/// sources are retried without hammering them. A debounced background sweep
/// drops expired entries and then evicts oldest-inserted entries until the
/// size bound holds again.
pub(crate) struct TtlCache<T: Clone + Send + Sync + 'static> {
    state: Arc<Mutex<CacheState<T>>>,
    max: usize,
    retry_delay: Duration,
    sweep_pending: Arc<AtomicBool>,
    sweep_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl<T: Clone + Send + Sync + 'static> TtlCache<T> {
    pub(crate) fn new(max: usize, retry_delay: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            })),
            max,
            retry_delay,
            sweep_pending: Arc::new(AtomicBool::new(false)),
            sweep_task: Mutex::new(None),
        }
    }

    /// Look up `key`, starting `producer` if no live entry exists.
    ///
    /// Exactly one producer runs per key at a time; concurrent callers share
    /// its result. Must be called from within a tokio runtime (inserts
    /// schedule the sweep task).
    pub(crate) fn get<F>(&self, key: &str, ttl: Duration, producer: F) -> Lookup<T>
    where
        F: Future<Output = Option<T>> + Send + 'static,
    {
        let now = Instant::now();

        let entry = {
            let mut state = self.state.lock();

            if let Some(entry) = state.entries.get(key) {
                let live = entry.expiration.lock().is_none_or(|at| at >= now);
                if live {
                    return Lookup {
                        value: entry.value.clone(),
                        cached: true,
                    };
                }
            }

            let expiration = Arc::new(Mutex::new(None));
            let completed = Arc::clone(&expiration);
            let retry_delay = self.retry_delay;

            let value: SharedValue<T> = async move {
                let data = producer.await;
                // Absent results expire early so the source gets retried.
                let lifetime = if data.is_some() { ttl } else { retry_delay };
                *completed.lock() = Some(Instant::now() + lifetime);
                data
            }
            .boxed()
            .shared();

            let entry = Entry { expiration, value };

            if state.entries.insert(key.to_string(), entry.clone()).is_some() {
                // Replacement: the key re-enters the eviction queue at the back.
                state.order.retain(|k| k != key);
            }
            state.order.push_back(key.to_string());

            entry
        };

        self.schedule_sweep();

        Lookup {
            value: entry.value,
            cached: false,
        }
    }

    /// Remove a single entry. In-flight producers keep running for anyone
    /// already awaiting them.
    pub(crate) fn invalidate(&self, key: &str) {
        let mut state = self.state.lock();
        if state.entries.remove(key).is_some() {
            state.order.retain(|k| k != key);
        }
    }

    /// Schedule the debounced sweep unless one is already pending
    fn schedule_sweep(&self) {
        if self.sweep_pending.swap(true, Ordering::AcqRel) {
            return;
        }

        let state = Arc::clone(&self.state);
        let pending = Arc::clone(&self.sweep_pending);
        let max = self.max;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(SWEEP_DEBOUNCE).await;
            pending.store(false, Ordering::Release);

            let now = Instant::now();
            let mut state = state.lock();
            let CacheState { entries, order } = &mut *state;

            order.retain(|key| match entries.get(key) {
                Some(entry) => {
                    let expired = entry.expiration.lock().is_some_and(|at| at < now);
                    if expired {
                        entries.remove(key);
                    }
                    !expired
                }
                None => false,
            });

            let evicted = entries.len().saturating_sub(max);
            for _ in 0..evicted {
                if let Some(key) = order.pop_front() {
                    entries.remove(&key);
                }
            }
            if evicted > 0 {
                tracing::trace!(evicted, "cache size bound reached");
            }
        });

        *self.sweep_task.lock() = Some(handle);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.state.lock().entries.contains_key(key)
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for TtlCache<T> {
    fn drop(&mut self) {
        // The sweep has no business outliving its cache.
        if let Some(handle) = self.sweep_task.lock().take() {
            handle.abort();
        }
    }
}
