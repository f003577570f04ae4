//! Query cache
//!
//! Entries are served without refetching while younger than the staleness window.
//! A stale entry is still returned immediately, and one background refresh replaces
//! it. Concurrent fetches of a missing key share a single request. Errors are never
//! cached.

use lru::LruCache;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use storybook_core::{AppError, StorefrontConfig};
use tokio::time::Instant;

use crate::key::QueryKey;

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

struct Entry {
    data: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
}

struct State {
    entries: LruCache<QueryKey, Entry>,
    /// Per-key fetch locks; holders are the only ones allowed to hit the network.
    locks: HashMap<QueryKey, Arc<tokio::sync::Mutex<()>>>,
    refreshing: HashSet<QueryKey>,
    /// Bumped on invalidation; a fetch that straddles a bump does not store.
    epochs: HashMap<String, u64>,
}

struct Inner {
    state: Mutex<State>,
    stale_time: Duration,
}

/// Shared request cache. Cheap to clone.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl QueryClient {
    pub fn new(stale_time: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    entries: LruCache::new(capacity),
                    locks: HashMap::new(),
                    refreshing: HashSet::new(),
                    epochs: HashMap::new(),
                }),
                stale_time,
            }),
        }
    }

    pub fn from_config(config: &StorefrontConfig) -> Self {
        Self::new(config.query_stale_time, DEFAULT_CACHE_CAPACITY)
    }

    pub fn stale_time(&self) -> Duration {
        self.inner.stale_time
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain maps behind; keep serving them.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn epoch(&self, resource: &str) -> u64 {
        self.state().epochs.get(resource).copied().unwrap_or(0)
    }

    /// Cached value and whether it is still fresh.
    fn lookup<T>(&self, key: &QueryKey) -> Option<(T, bool)>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut state = self.state();
        let entry = state.entries.get(key)?;
        let fresh = entry.fetched_at.elapsed() < self.inner.stale_time;
        entry
            .data
            .downcast_ref::<T>()
            .map(|value| (value.clone(), fresh))
    }

    fn store<T>(&self, key: &QueryKey, value: T, epoch_at_start: u64)
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut state = self.state();
        let current = state.epochs.get(key.resource()).copied().unwrap_or(0);
        if current != epoch_at_start {
            tracing::debug!(key = %key, "Query invalidated while fetching, result not cached");
            return;
        }
        state.entries.put(
            key.clone(),
            Entry {
                data: Arc::new(value),
                fetched_at: Instant::now(),
            },
        );
    }

    fn fetch_lock(&self, key: &QueryKey) -> Arc<tokio::sync::Mutex<()>> {
        self.state()
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Return the cached value for `key`, fetching it with `fetcher` when needed.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T, AppError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        match self.lookup::<T>(&key) {
            Some((value, true)) => {
                tracing::trace!(key = %key, "Query cache hit");
                return Ok(value);
            }
            Some((value, false)) => {
                self.spawn_refresh(key, fetcher);
                return Ok(value);
            }
            None => {}
        }

        let lock = self.fetch_lock(&key);
        let result = {
            let _guard = lock.lock().await;

            // Another caller may have filled the entry while we waited.
            match self.lookup::<T>(&key) {
                Some((value, _)) => Ok(value),
                None => {
                    let epoch = self.epoch(key.resource());
                    tracing::debug!(key = %key, "Query cache miss, fetching");
                    fetcher().await.map(|value| {
                        self.store(&key, value.clone(), epoch);
                        value
                    })
                }
            }
        };
        self.release_fetch_lock(&key, lock);
        result
    }

    /// Forget the fetch lock for `key` once no other caller holds or waits on it.
    fn release_fetch_lock(&self, key: &QueryKey, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut state = self.state();
        drop(lock);
        let idle = state
            .locks
            .get(key)
            .is_some_and(|current| Arc::strong_count(current) == 1);
        if idle {
            state.locks.remove(key);
        }
    }

    fn spawn_refresh<T, F, Fut>(&self, key: QueryKey, fetcher: F)
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        if !self.state().refreshing.insert(key.clone()) {
            return;
        }

        let client = self.clone();
        let epoch = self.epoch(key.resource());
        tracing::debug!(key = %key, "Serving stale query, refreshing in background");
        tokio::spawn(async move {
            match fetcher().await {
                Ok(value) => client.store(&key, value, epoch),
                Err(e) => tracing::warn!(key = %key, error = %e, "Background refresh failed"),
            }
            client.state().refreshing.remove(&key);
        });
    }

    /// Cached value regardless of staleness.
    pub fn get_data<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.lookup::<T>(key).map(|(value, _)| value)
    }

    /// Seed or overwrite an entry, e.g. with a mutation response.
    pub fn set_data<T>(&self, key: QueryKey, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        let epoch = self.epoch(key.resource());
        self.store(&key, value, epoch);
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        let state = self.state();
        state
            .entries
            .peek(key)
            .map(|e| e.fetched_at.elapsed() >= self.inner.stale_time)
            .unwrap_or(true)
    }

    /// Drop every entry for `resource` so the next read refetches. Returns how many
    /// entries were removed.
    pub fn invalidate(&self, resource: &str) -> usize {
        let mut state = self.state();
        *state.epochs.entry(resource.to_string()).or_insert(0) += 1;

        let doomed: Vec<QueryKey> = state
            .entries
            .iter()
            .filter(|(k, _)| k.resource() == resource)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            state.entries.pop(key);
        }
        state.locks.retain(|k, lock| {
            k.resource() != resource || Arc::strong_count(lock) > 1
        });

        tracing::debug!(resource = %resource, removed = doomed.len(), "Invalidated queries");
        doomed.len()
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
