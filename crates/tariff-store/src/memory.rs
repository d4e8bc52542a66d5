use std::path::Path;

use async_trait::async_trait;
use tariff_models::rate::{RateCandidate, RateQuery};

use crate::error::StoreError;
use crate::RateStore;

/// Rate store over a fixed, in-memory list of candidates.
///
/// Used for JSON rate files and tests. Query results keep the list order.
pub struct MemoryRateStore {
    rates: Vec<RateCandidate>,
}

impl MemoryRateStore {
    pub fn new(rates: Vec<RateCandidate>) -> Self {
        Self { rates }
    }

    /// Parse a JSON array of rate candidates.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    fn matching(&self, query: &RateQuery) -> Vec<RateCandidate> {
        self.rates
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find_candidates(&self, query: &RateQuery) -> Result<Vec<RateCandidate>, StoreError> {
        Ok(self.matching(query))
    }
}
