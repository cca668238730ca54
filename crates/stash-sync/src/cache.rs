//! Named-query cache contract and an in-memory read-through implementation.
//!
//! Cached results are keyed by `(QueryKey, params)`. Invalidating an identity drops all
//! of its entries and bumps the identity's generation: a fetch that was already in
//! flight when the generation moved is handed back to its caller but not stored.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use stash_core::{QueryKey, TransportError};

/// Receiver side of cache invalidation. Keys passed together form one batch.
#[async_trait]
pub trait QueryInvalidator: Send + Sync {
    async fn invalidate(&self, keys: &[QueryKey]);
}

type CachedValue = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
struct CacheState {
    entries: HashMap<(QueryKey, String), CachedValue>,
    generations: HashMap<QueryKey, u64>,
}

impl CacheState {
    fn generation(&self, key: QueryKey) -> u64 {
        self.generations.get(&key).copied().unwrap_or(0)
    }
}

/// Keyed read-through cache.
///
/// Cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct QueryCache {
    state: Arc<RwLock<CacheState>>,
    invalidations: broadcast::Sender<Vec<QueryKey>>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (invalidations, _) = broadcast::channel(16);
        Self {
            state: Arc::new(RwLock::new(CacheState::default())),
            invalidations,
        }
    }

    /// Notified with each invalidated batch, so views can refetch.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<QueryKey>> {
        self.invalidations.subscribe()
    }

    /// Return the fresh cached value for `(key, params)`, or run `fetch` and cache it.
    ///
    /// A failed fetch returns its error; nothing cached under another key is returned
    /// in its place.
    pub async fn read<T, F, Fut>(
        &self,
        key: QueryKey,
        params: &str,
        fetch: F,
    ) -> Result<T, TransportError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let cache_key = (key, params.to_string());

        let generation = {
            let state = self.state.read().await;
            if let Some(value) = state
                .entries
                .get(&cache_key)
                .and_then(|entry| entry.downcast_ref::<T>())
            {
                tracing::debug!(query = %key, params, "Cache hit");
                return Ok(value.clone());
            }
            state.generation(key)
        };

        tracing::debug!(query = %key, params, "Cache miss, fetching");
        let value = match fetch().await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(query = %key, params, error = %e, "Query fetch failed");
                return Err(e);
            }
        };

        let mut state = self.state.write().await;
        if state.generation(key) == generation {
            state.entries.insert(cache_key, Arc::new(value.clone()));
        } else {
            tracing::debug!(
                query = %key,
                params,
                "Result fetched before invalidation, not caching"
            );
        }

        Ok(value)
    }

    /// Whether a cached entry exists for `(key, params)`.
    pub async fn is_fresh(&self, key: QueryKey, params: &str) -> bool {
        let state = self.state.read().await;
        state.entries.contains_key(&(key, params.to_string()))
    }

    /// Number of cached entries across all identities.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn generation(&self, key: QueryKey) -> u64 {
        self.state.read().await.generation(key)
    }
}

#[async_trait]
impl QueryInvalidator for QueryCache {
    async fn invalidate(&self, keys: &[QueryKey]) {
        {
            let mut state = self.state.write().await;
            for key in keys {
                *state.generations.entry(*key).or_default() += 1;
            }
            state
                .entries
                .retain(|(key, _), _| !keys.contains(key));
        }

        tracing::info!(queries = ?keys, "Invalidated cached queries");
        // no subscribers is fine
        let _ = self.invalidations.send(keys.to_vec());
    }
}
