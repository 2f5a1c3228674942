//! A key/value cache of query results with stale-time based refetching.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::client::ClientError;

/// How long cached list and total queries are considered fresh.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

/// Identifies a cached query, e.g. `["accounts", "<user id>"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Create a key from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// The segments of the key.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether the first segments of this key equal `prefix`.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

/// How long a cached result stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleTime {
    /// The result is stale once it is older than the duration.
    Duration(Duration),
    /// The result never goes stale on its own.
    Infinity,
}

impl StaleTime {
    fn is_stale(self, age: Duration) -> bool {
        match self {
            StaleTime::Duration(stale_time) => age >= stale_time,
            StaleTime::Infinity => false,
        }
    }
}

impl Default for StaleTime {
    fn default() -> Self {
        StaleTime::Duration(DEFAULT_STALE_TIME)
    }
}

/// Describes a cached query: where its result lives and how long it stays
/// fresh. The fetcher is supplied by the caller of
/// [QueryClient::fetch_query] and [QueryClient::ensure_query_data].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// The key the result is stored under.
    pub key: QueryKey,
    /// How long the result stays fresh.
    pub stale_time: StaleTime,
}

impl QueryOptions {
    /// A query with the default stale time.
    pub fn new(key: QueryKey) -> Self {
        Self {
            key,
            stale_time: StaleTime::default(),
        }
    }

    /// Set the stale time.
    pub fn stale_time(mut self, stale_time: StaleTime) -> Self {
        self.stale_time = stale_time;
        self
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    updated_at: Instant,
    invalidated: bool,
}

/// The cached results, keyed by [QueryKey].
///
/// The last write for a key wins.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
}

impl QueryCache {
    /// The cached value for `key`.
    pub fn get(&self, key: &QueryKey) -> Option<&Value> {
        self.entries.get(key).map(|entry| &entry.data)
    }

    /// Store `data` under `key`, marking it fresh.
    pub fn set(&mut self, key: QueryKey, data: Value) {
        self.entries.insert(
            key,
            CacheEntry {
                data,
                updated_at: Instant::now(),
                invalidated: false,
            },
        );
    }

    /// Replace the data under `key` without changing when it goes stale.
    ///
    /// An invalidated entry stays invalidated. A new key is stored fresh.
    pub fn replace(&mut self, key: QueryKey, data: Value) {
        match self.entries.get_mut(&key) {
            Some(entry) => entry.data = data,
            None => self.set(key, data),
        }
    }

    /// Whether `key` holds a result that does not need refetching.
    pub fn is_fresh(&self, key: &QueryKey, stale_time: StaleTime) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.invalidated && !stale_time.is_stale(entry.updated_at.elapsed()))
    }

    /// Mark every entry whose key starts with `prefix` as stale.
    ///
    /// Returns the number of entries invalidated.
    pub fn invalidate(&mut self, prefix: &QueryKey) -> usize {
        let mut count = 0;

        for (key, entry) in self.entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                count += 1;
            }
        }

        count
    }
}

/// A shared handle to a [QueryCache] with typed accessors.
///
/// Clones share the same cache. The lock is never held across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct QueryClient {
    cache: Arc<Mutex<QueryCache>>,
}

impl QueryClient {
    /// Create a client with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueryCache> {
        // Entries are replaced whole, so a poisoned cache is still consistent.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The cached data for `key`, if present and of type `T`.
    pub fn get_query_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = self.lock().get(key)?.clone();

        match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(error) => {
                tracing::warn!("cached data for {key:?} has an unexpected shape: {error}");
                None
            }
        }
    }

    /// Replace the cached data for `key`.
    pub fn set_query_data<T: Serialize>(&self, key: &QueryKey, data: &T) {
        match serde_json::to_value(data) {
            Ok(value) => self.lock().set(key.clone(), value),
            Err(error) => tracing::error!("could not cache data for {key:?}: {error}"),
        }
    }

    /// Replace the cached data for `key` with the result of `update`.
    ///
    /// `update` receives the current data, if any. Returning `None` leaves the
    /// cache unchanged. The entry keeps its staleness, so a patched query that
    /// was invalidated is still refetched.
    pub fn update_query_data<T, F>(&self, key: &QueryKey, update: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> Option<T>,
    {
        let updated = update(self.get_query_data(key))?;

        match serde_json::to_value(&updated) {
            Ok(value) => self.lock().replace(key.clone(), value),
            Err(error) => tracing::error!("could not cache data for {key:?}: {error}"),
        }

        Some(updated)
    }

    /// Return the cached data for the query, calling `fetch` only if nothing
    /// is cached. Stale data is returned as is.
    ///
    /// # Errors
    /// Returns the error from `fetch`, in which case nothing is cached.
    pub async fn ensure_query_data<T, F, Fut>(&self, query: &QueryOptions, fetch: F) -> Result<T, ClientError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        if let Some(data) = self.get_query_data(&query.key) {
            return Ok(data);
        }

        self.fetch_and_store(query, fetch).await
    }

    /// Return the cached data for the query if it is fresh, otherwise call
    /// `fetch` and cache the result.
    ///
    /// # Errors
    /// Returns the error from `fetch`, in which case the cache is unchanged.
    pub async fn fetch_query<T, F, Fut>(&self, query: &QueryOptions, fetch: F) -> Result<T, ClientError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let is_fresh = self.lock().is_fresh(&query.key, query.stale_time);

        if is_fresh {
            if let Some(data) = self.get_query_data(&query.key) {
                return Ok(data);
            }
        }

        self.fetch_and_store(query, fetch).await
    }

    async fn fetch_and_store<T, F, Fut>(&self, query: &QueryOptions, fetch: F) -> Result<T, ClientError>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let data = fetch().await?;
        self.set_query_data(&query.key, &data);

        Ok(data)
    }

    /// Mark every query whose key starts with `prefix` as stale, so the next
    /// [QueryClient::fetch_query] refetches it.
    pub fn invalidate_queries(&self, prefix: &QueryKey) -> usize {
        self.lock().invalidate(prefix)
    }
}
