//! Single-flight lookup cache for read-mostly reference data.
//!
//! [`LookupCache`] memoizes remote lookups keyed by a deterministic string.
//! Concurrent callers for the same key are multiplexed onto one shared
//! in-flight fetch; the underlying request is never issued twice concurrently
//! for the same key. Entries expire lazily: each carries its creation
//! timestamp and is discarded on the next access once older than the TTL
//! (plus [`LookupCache::sweep`] for active eviction).
//!
//! Capacity is bounded with FIFO eviction by insertion order, not
//! last-access. Failed fetches are never cached: the entry evicts itself on
//! failure so the next caller retries, while every waiter already attached to
//! the shared lookup observes the same error.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, trace};

use crate::error::ApiError;

/// A pending-or-resolved lookup, shared by all callers for one key.
type SharedLookup<T> = Shared<BoxFuture<'static, Result<T, ApiError>>>;

struct CacheEntry<T> {
    /// Distinguishes this entry from any later entry under the same key, so
    /// a failing lookup only evicts itself.
    generation: u64,
    created_at: Instant,
    lookup: SharedLookup<T>,
}

struct Inner<T> {
    entries: HashMap<String, CacheEntry<T>>,
    /// Insertion order of live keys; the front is evicted first.
    order: VecDeque<String>,
    next_generation: u64,
}

impl<T> Inner<T> {
    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }
}

/// A bounded, time-expiring, single-flight cache of remote lookups.
///
/// Cloning is cheap and shares the underlying map.
pub struct LookupCache<T> {
    inner: Arc<Mutex<Inner<T>>>,
    ttl: Duration,
    max_entries: usize,
}

impl<T> Clone for LookupCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            ttl: self.ttl,
            max_entries: self.max_entries,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> LookupCache<T> {
    /// Create a cache holding at most `max_entries` lookups for `ttl` each.
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                next_generation: 0,
            })),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Return the lookup registered under `key`, fetching at most once.
    ///
    /// If an unexpired entry exists (resolved or still in flight), its result
    /// is shared. Otherwise `fetch` is started exactly once, registered under
    /// `key`, and awaited; a failed fetch removes its own entry before the
    /// error is returned, so it is never served to a later caller.
    ///
    /// # Errors
    ///
    /// Propagates the fetch error; every concurrent waiter for the same
    /// in-flight lookup receives a clone of the same error.
    pub async fn get_or_fetch<F>(&self, key: &str, fetch: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let lookup = {
            let mut inner = self.lock();

            let fresh = inner.entries.get(key).and_then(|entry| {
                (entry.created_at.elapsed() < self.ttl).then(|| entry.lookup.clone())
            });

            if let Some(lookup) = fresh {
                debug!(key, "lookup cache hit");
                lookup
            } else {
                // Drops the expired entry if one was present.
                trace!(key, "lookup cache miss");
                inner.remove(key);
                self.install(&mut inner, key, fetch)
            }
        };

        lookup.await
    }

    /// Remove the entry for `key`, if any.
    pub fn invalidate(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Drop every entry immediately.
    pub fn invalidate_all(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Actively remove expired entries instead of waiting for the next
    /// access.
    pub fn sweep(&self) {
        let ttl = self.ttl;
        let mut inner = self.lock();
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.created_at.elapsed() >= ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            inner.remove(&key);
        }
    }

    /// Number of registered lookups, including in-flight ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache holds no lookups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a fresh lookup under `key` and FIFO-evict past capacity.
    fn install<F>(&self, inner: &mut Inner<T>, key: &str, fetch: F) -> SharedLookup<T>
    where
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let generation = inner.next_generation;
        inner.next_generation += 1;

        let map = Arc::clone(&self.inner);
        let owned_key = key.to_string();
        let lookup: SharedLookup<T> = async move {
            let result = fetch.await;
            if result.is_err() {
                let mut inner = map.lock().unwrap_or_else(PoisonError::into_inner);
                let is_same = inner
                    .entries
                    .get(&owned_key)
                    .is_some_and(|entry| entry.generation == generation);
                if is_same {
                    debug!(key = %owned_key, "evicting failed lookup");
                    inner.remove(&owned_key);
                }
            }
            result
        }
        .boxed()
        .shared();

        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                generation,
                created_at: Instant::now(),
                lookup: lookup.clone(),
            },
        );
        inner.order.push_back(key.to_string());

        // FIFO by insertion order; deliberately not access-frequency aware.
        while inner.entries.len() > self.max_entries {
            if let Some(oldest) = inner.order.pop_front() {
                debug!(key = %oldest, "evicting oldest lookup at capacity");
                inner.entries.remove(&oldest);
            } else {
                break;
            }
        }

        lookup
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fetch(
        counter: &Arc<AtomicUsize>,
        value: &str,
    ) -> impl Future<Output = Result<String, ApiError>> + Send + 'static {
        let counter = Arc::clone(counter);
        let value = value.to_string();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }
    }

    #[tokio::test]
    async fn test_second_lookup_within_ttl_is_served_from_cache() {
        let cache: LookupCache<String> = LookupCache::new(Duration::from_secs(60), 10);
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get_or_fetch("categories", counting_fetch(&calls, "a"))
            .await
            .unwrap();
        let second = cache
            .get_or_fetch("categories", counting_fetch(&calls, "b"))
            .await
            .unwrap();

        assert_eq!(first, "a");
        assert_eq!(second, "a"); // the second fetch was never started
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lookup_after_expiry_fetches_again() {
        let cache: LookupCache<String> = LookupCache::new(Duration::from_millis(40), 10);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch("k", counting_fetch(&calls, "a"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        let value = cache
            .get_or_fetch("k", counting_fetch(&calls, "b"))
            .await
            .unwrap();

        assert_eq!(value, "b");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_fetch() {
        let cache: LookupCache<String> = LookupCache::new(Duration::from_secs(60), 10);
        let calls = Arc::new(AtomicUsize::new(0));

        let slow = |val: &str| {
            let counter = Arc::clone(&calls);
            let val = val.to_string();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(val)
            }
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch("k", slow("first")),
            cache.get_or_fetch("k", slow("second")),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_keys_fetch_independently() {
        let cache: LookupCache<String> = LookupCache::new(Duration::from_secs(60), 10);
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.get_or_fetch("k1", counting_fetch(&calls, "one")),
            cache.get_or_fetch("k2", counting_fetch(&calls, "two")),
        );

        assert_eq!(a.unwrap(), "one");
        assert_eq!(b.unwrap(), "two");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache: LookupCache<String> = LookupCache::new(Duration::from_secs(60), 10);
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = {
            let counter = Arc::clone(&calls);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::Transport("connection reset".to_string()))
            }
        };

        let err = cache.get_or_fetch("k", failing).await.unwrap_err();
        assert!(err.is_transient());
        assert!(cache.is_empty(), "failed lookup must leave no entry");

        // The next caller retries rather than observing a cached error.
        let value = cache
            .get_or_fetch("k", counting_fetch(&calls, "recovered"))
            .await
            .unwrap();
        assert_eq!(value, "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_waiters_observe_same_failure() {
        let cache: LookupCache<String> = LookupCache::new(Duration::from_secs(60), 10);
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = || {
            let counter = Arc::clone(&calls);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
                Err::<String, _>(ApiError::Status {
                    status: 502,
                    message: "bad gateway".to_string(),
                })
            }
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch("k", failing()),
            cache.get_or_fetch("k", failing()),
        );

        assert_eq!(a.unwrap_err(), b.unwrap_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest_inserted() {
        let cache: LookupCache<String> = LookupCache::new(Duration::from_secs(60), 2);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch("k1", counting_fetch(&calls, "1"))
            .await
            .unwrap();
        cache
            .get_or_fetch("k2", counting_fetch(&calls, "2"))
            .await
            .unwrap();

        // Access k1 again; FIFO ignores recency, so k1 is still the oldest.
        cache
            .get_or_fetch("k1", counting_fetch(&calls, "1-again"))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cache
            .get_or_fetch("k3", counting_fetch(&calls, "3"))
            .await
            .unwrap();
        assert_eq!(cache.len(), 2);

        // k1 was evicted despite the recent access; k2 survived.
        cache
            .get_or_fetch("k2", counting_fetch(&calls, "2-again"))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let refetched = cache
            .get_or_fetch("k1", counting_fetch(&calls, "1-refetched"))
            .await
            .unwrap();
        assert_eq!(refetched, "1-refetched");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let cache: LookupCache<String> = LookupCache::new(Duration::from_secs(60), 10);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch("k", counting_fetch(&calls, "a"))
            .await
            .unwrap();
        cache.invalidate("k");

        let value = cache
            .get_or_fetch("k", counting_fetch(&calls, "b"))
            .await
            .unwrap();
        assert_eq!(value, "b");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_all_drops_every_entry() {
        let cache: LookupCache<String> = LookupCache::new(Duration::from_secs(60), 10);
        let calls = Arc::new(AtomicUsize::new(0));

        for key in ["products:1", "products:2", "product:p9"] {
            cache
                .get_or_fetch(key, counting_fetch(&calls, key))
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 3);

        cache.invalidate_all();
        assert!(cache.is_empty());

        // Entries are gone, not just hidden: the next lookup refetches.
        cache
            .get_or_fetch("products:1", counting_fetch(&calls, "again"))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_entries() {
        let cache: LookupCache<String> = LookupCache::new(Duration::from_millis(30), 10);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch("k", counting_fetch(&calls, "a"))
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.sweep();
        assert!(cache.is_empty());
    }
}
