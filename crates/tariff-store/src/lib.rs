pub mod cached;
pub mod error;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use tariff_models::rate::{RateCandidate, RateQuery};

pub use cached::CachedRateStore;
pub use error::StoreError;
pub use memory::MemoryRateStore;
pub use sqlite::SqliteRateStore;

/// Source of candidate tariff-rate records. Mockable for testing.
///
/// Implementations return every record matching the query, in any order and
/// regardless of validity dates; picking the applicable one is the engine's job.
#[async_trait]
pub trait RateStore: Send + Sync {
    fn name(&self) -> &str;

    async fn find_candidates(&self, query: &RateQuery) -> Result<Vec<RateCandidate>, StoreError>;
}
