use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;

use crate::error::{AppError, Result};
use crate::query::LookupKey;

#[derive(Clone, Debug)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Utc::now(),
        }
    }

    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.stored_at
    }
}

/// Process-wide key/value store with an optional time-to-live.
///
/// Expired entries are never returned; moka drops them during the
/// housekeeping that runs alongside later reads and writes; there is no
/// background sweeper. Per-key reads and writes are atomic, so a reader sees
/// either the old entry or the complete new one.
#[derive(Clone)]
pub struct CacheStore<T: Clone + Send + Sync + 'static> {
    name: &'static str,
    inner: Cache<LookupKey, CacheEntry<T>>,
    ttl: Option<Duration>,
}

impl<T: Clone + Send + Sync + 'static> CacheStore<T> {
    /// `ttl = None` keeps entries until capacity pressure or explicit invalidation.
    pub fn new(name: &'static str, max_capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().name(name).max_capacity(max_capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            name,
            inner: builder.build(),
            ttl,
        }
    }

    pub async fn get(&self, key: &LookupKey) -> Option<T> {
        let entry = self.inner.get(key).await?;
        tracing::debug!(
            cache = self.name,
            %key,
            age_ms = entry.age().num_milliseconds(),
            "cache hit"
        );
        Some(entry.value)
    }

    pub async fn put(&self, key: LookupKey, value: T) {
        self.inner.insert(key, CacheEntry::new(value)).await;
    }

    pub async fn invalidate(&self, key: &LookupKey) {
        tracing::debug!(cache = self.name, %key, "invalidating cache entry");
        self.inner.invalidate(key).await;
    }

    /// Returns the cached value, or runs `init` to produce and store it.
    ///
    /// Concurrent callers missing on the same key share a single `init`
    /// run and all observe its result. Errors are handed to every waiter
    /// and nothing is stored.
    pub async fn get_or_try_insert_with<F>(&self, key: LookupKey, init: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let label = key.to_string();
        let entry = self
            .inner
            .entry(key)
            .or_try_insert_with(async { init.await.map(CacheEntry::new) })
            .await
            .map_err(|err: Arc<AppError>| (*err).clone())?;

        if entry.is_fresh() {
            tracing::debug!(cache = self.name, key = %label, "cache populated");
        } else {
            tracing::debug!(
                cache = self.name,
                key = %label,
                age_ms = entry.value().age().num_milliseconds(),
                "cache hit"
            );
        }
        Ok(entry.into_value().value)
    }

    /// Number of live entries, after flushing moka's pending maintenance.
    pub async fn len(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Forecast, Location};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn seattle() -> Location {
        Location {
            search_query: "seattle".to_string(),
            formatted_query: "Seattle, WA".to_string(),
            latitude: 47.6,
            longitude: -122.3,
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = CacheStore::new("locations", 10, None);
        let key = LookupKey::city("Seattle").unwrap();

        store.put(key.clone(), seattle()).await;

        assert_eq!(store.get(&key).await, Some(seattle()));
        assert_eq!(store.get(&LookupKey::city("tacoma").unwrap()).await, None);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = CacheStore::new("locations", 10, None);
        let key = LookupKey::city("seattle").unwrap();
        store.put(key.clone(), seattle()).await;

        let mut moved = seattle();
        moved.formatted_query = "Seattle, Washington".to_string();
        store.put(key.clone(), moved.clone()).await;

        assert_eq!(store.get(&key).await, Some(moved));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let store = CacheStore::new("locations", 10, None);
        let key = LookupKey::city("seattle").unwrap();
        store.put(key.clone(), seattle()).await;

        store.invalidate(&key).await;

        assert_eq!(store.get(&key).await, None);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_and_evicted() {
        let ttl = Duration::from_millis(50);
        let store: CacheStore<Vec<Forecast>> = CacheStore::new("forecasts", 10, Some(ttl));
        let key = LookupKey::coordinates(47.6, -122.3);
        let forecasts = vec![Forecast {
            forecast: "Sunny".to_string(),
            time: "2024-01-01".to_string(),
        }];

        store.put(key.clone(), forecasts.clone()).await;
        assert_eq!(store.get(&key).await, Some(forecasts));

        tokio::time::sleep(ttl + Duration::from_millis(50)).await;

        assert_eq!(store.get(&key).await, None);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with_runs_init_once() {
        let store = CacheStore::new("locations", 10, None);
        let calls = Arc::new(AtomicUsize::new(0));
        let key = LookupKey::city("seattle").unwrap();

        let fill = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(seattle())
        };

        let (a, b) = tokio::join!(
            store.get_or_try_insert_with(key.clone(), fill(calls.clone())),
            store.get_or_try_insert_with(key.clone(), fill(calls.clone())),
        );

        assert_eq!(a.unwrap(), seattle());
        assert_eq!(b.unwrap(), seattle());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get(&key).await, Some(seattle()));
    }

    #[tokio::test]
    async fn test_failed_init_is_not_cached() {
        let store: CacheStore<Location> = CacheStore::new("locations", 10, None);
        let key = LookupKey::city("atlantis").unwrap();

        let err = store
            .get_or_try_insert_with(key.clone(), async {
                Err(AppError::Upstream("no results".to_string()))
            })
            .await
            .unwrap_err();

        assert_eq!(err, AppError::Upstream("no results".to_string()));
        assert_eq!(store.get(&key).await, None);

        let value = store
            .get_or_try_insert_with(key.clone(), async { Ok(seattle()) })
            .await
            .unwrap();
        assert_eq!(value, seattle());
    }
}
