//! Fixtures and a recording rate store for exercising the calculator without a database.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tariff_models::rate::{Agreement, AgreementStatus, Basis, DutyRate, RateCandidate, RateQuery};
use tariff_models::request::CalculationRequest;
use tariff_store::{MemoryRateStore, RateStore, StoreError};

pub const IMPORTER: &str = "US";
pub const HS_CODE: &str = "87038010";

/// An origin-independent MFN rate for `IMPORTER`/`HS_CODE`.
pub fn mfn_rate(valid_from: NaiveDate, rate: DutyRate) -> RateCandidate {
    RateCandidate {
        id: None,
        importer: IMPORTER.to_string(),
        origin: None,
        hs_code: HS_CODE.to_string(),
        basis: Basis::Mfn,
        rate,
        valid_from,
        valid_to: None,
        agreement: None,
        source_ref: None,
    }
}

/// A preferential rate from `origin` under an in-force agreement with the given
/// RVC threshold (a percentage, 30.00 = 30%).
pub fn pref_rate(
    origin: &str,
    valid_from: NaiveDate,
    rate: DutyRate,
    rvc_threshold: Option<Decimal>,
) -> RateCandidate {
    RateCandidate {
        origin: Some(origin.to_string()),
        basis: Basis::Pref,
        agreement: Some(Agreement {
            id: Some(1),
            name: Some(format!("{IMPORTER}-{origin} FTA")),
            status: Some(AgreementStatus::InForce),
            rvc_threshold,
        }),
        ..mfn_rate(valid_from, rate)
    }
}

/// A request whose RVC numerator is `originating` (all material cost) over `fob`.
pub fn rvc_request(originating: Decimal, fob: Decimal) -> CalculationRequest {
    CalculationRequest {
        quantity: Some(100),
        total_value: Decimal::ONE_THOUSAND,
        material_cost: originating,
        fob: Some(fob),
        ..CalculationRequest::default()
    }
}

/// The reference shipment: costs 50 + 10 + 5 + 5 + 0 over FOB 100, value 1000, 100 units.
pub fn scenario_request() -> CalculationRequest {
    CalculationRequest {
        quantity: Some(100),
        total_value: Decimal::ONE_THOUSAND,
        material_cost: Decimal::from(50),
        labour_cost: Decimal::from(10),
        overhead_cost: Decimal::from(5),
        profit: Decimal::from(5),
        other_costs: Decimal::ZERO,
        fob: Some(Decimal::ONE_HUNDRED),
    }
}

/// A memory store that records every query it answers.
pub struct RecordingRateStore {
    inner: MemoryRateStore,
    queries: Mutex<Vec<RateQuery>>,
    should_fail: bool,
}

impl RecordingRateStore {
    pub fn new(rates: Vec<RateCandidate>) -> Self {
        Self {
            inner: MemoryRateStore::new(rates),
            queries: Mutex::new(Vec::new()),
            should_fail: false,
        }
    }

    /// A store whose every query fails as unavailable.
    pub fn failing() -> Self {
        let mut store = Self::new(Vec::new());
        store.should_fail = true;
        store
    }

    pub fn queries(&self) -> Vec<RateQuery> {
        self.queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RateStore for RecordingRateStore {
    fn name(&self) -> &str {
        "recording"
    }

    async fn find_candidates(&self, query: &RateQuery) -> Result<Vec<RateCandidate>, StoreError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }
        if self.should_fail {
            return Err(StoreError::Unavailable("Mock failure".to_string()));
        }
        self.inner.find_candidates(query).await
    }
}
