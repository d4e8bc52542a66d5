use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rate::{Agreement, Basis, RateCandidate};

/// Outcome of one duty calculation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalculationResult {
    pub calculation_id: Uuid,
    pub calculated_at: DateTime<Utc>,
    /// Reference date the candidate rates were resolved against.
    pub as_of: NaiveDate,
    pub basis_applied: Basis,
    pub applied_rate: RateCandidate,
    /// RVC ratio at 6 dp. Reported on the MFN path too; None when FOB was absent or zero.
    pub rvc_computed: Option<Decimal>,
    /// Threshold ratio the RVC was tested against, when the preferential agreement has one.
    pub rvc_threshold: Option<Decimal>,
    /// Duty at 2 dp.
    pub total_duty: Decimal,
}

impl CalculationResult {
    /// RVC as a percentage (0.700000 -> 70.0000).
    pub fn rvc_percent(&self) -> Option<Decimal> {
        self.rvc_computed.map(|r| r * Decimal::ONE_HUNDRED)
    }
}

/// The rates in force for an importer/origin/HS code on a date, without a calculation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLookup {
    pub as_of: NaiveDate,
    pub mfn: RateCandidate,
    pub pref: Option<RateCandidate>,
    /// Agreement attached to the preferential rate.
    pub agreement: Option<Agreement>,
}
