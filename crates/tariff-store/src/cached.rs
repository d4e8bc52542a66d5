use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tariff_models::rate::{RateCandidate, RateQuery};
use tracing::debug;

use crate::error::StoreError;
use crate::RateStore;

/// Read-through cache in front of another rate store: moka (hot) -> inner store.
///
/// Query results are cached whole, keyed by `RateQuery::cache_key`, and evicted after TTL.
/// Empty results are cached too. Errors are not.
pub struct CachedRateStore {
    inner: Arc<dyn RateStore>,
    memory: Cache<String, Arc<Vec<RateCandidate>>>,
}

impl CachedRateStore {
    pub fn new(inner: Arc<dyn RateStore>, max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            memory: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn invalidate(&self, query: &RateQuery) {
        self.memory.invalidate(&query.cache_key()).await;
    }

    /// Number of distinct queries currently cached, after pending evictions are applied.
    pub async fn cached_queries(&self) -> u64 {
        self.memory.run_pending_tasks().await;
        self.memory.entry_count()
    }
}

#[async_trait]
impl RateStore for CachedRateStore {
    fn name(&self) -> &str {
        "cached"
    }

    async fn find_candidates(&self, query: &RateQuery) -> Result<Vec<RateCandidate>, StoreError> {
        let key = query.cache_key();

        // 1. Check moka hot cache
        if let Some(hit) = self.memory.get(&key).await {
            debug!(key = %key, "Rate cache hit");
            return Ok(hit.as_ref().clone());
        }

        // 2. Fall through to the backing store and promote
        let rows = self.inner.find_candidates(query).await?;
        debug!(key = %key, store = self.inner.name(), rows = rows.len(), "Rate cache miss");
        self.memory.insert(key, Arc::new(rows.clone())).await;
        Ok(rows)
    }
}
