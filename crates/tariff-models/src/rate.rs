use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored enum value that matches none of the known variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Tariff basis. Stored as `MFN` | `PREF`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Basis {
    /// Most-favoured-nation, the mandatory fallback basis.
    Mfn,
    /// Preferential rate under a trade agreement.
    Pref,
}

impl Basis {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Basis::Mfn => "MFN",
            Basis::Pref => "PREF",
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for Basis {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            v if v.eq_ignore_ascii_case("MFN") => Ok(Basis::Mfn),
            v if v.eq_ignore_ascii_case("PREF") => Ok(Basis::Pref),
            other => Err(UnknownVariant::new("tariff basis", other)),
        }
    }
}

/// Rate type discriminant. Stored as `ad_valorem` | `specific` | `compound`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    AdValorem,
    Specific,
    Compound,
}

impl RateType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            RateType::AdValorem => "ad_valorem",
            RateType::Specific => "specific",
            RateType::Compound => "compound",
        }
    }
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for RateType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim();
        [RateType::AdValorem, RateType::Specific, RateType::Compound]
            .into_iter()
            .find(|t| t.as_db_str().eq_ignore_ascii_case(v))
            .ok_or_else(|| UnknownVariant::new("tariff rate type", v))
    }
}

/// Agreement lifecycle status. Stored as `in_force` | `signed` | `inactive`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    InForce,
    Signed,
    Inactive,
}

impl AgreementStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AgreementStatus::InForce => "in_force",
            AgreementStatus::Signed => "signed",
            AgreementStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for AgreementStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim();
        [
            AgreementStatus::InForce,
            AgreementStatus::Signed,
            AgreementStatus::Inactive,
        ]
        .into_iter()
        .find(|st| st.as_db_str().eq_ignore_ascii_case(v))
        .ok_or_else(|| UnknownVariant::new("agreement status", v))
    }
}

/// Trade-agreement metadata relevant to origin qualification.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Agreement {
    pub id: Option<i64>,
    pub name: Option<String>,
    /// Informational only; qualification does not look at it.
    pub status: Option<AgreementStatus>,
    /// RVC threshold as a percentage (40.00 = 40%). None = no RVC rule configured.
    pub rvc_threshold: Option<Decimal>,
}

impl Agreement {
    /// The threshold as a ratio (40.00 -> 0.40).
    pub fn rvc_threshold_ratio(&self) -> Option<Decimal> {
        self.rvc_threshold.map(|pct| pct / Decimal::ONE_HUNDRED)
    }
}

/// Duty formula with its per-variant payload.
///
/// Numeric fields stay optional: a missing component contributes zero duty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "rate_type", rename_all = "snake_case")]
pub enum DutyRate {
    /// Percentage of value. `ad_valorem_rate` is a ratio (0.10 = 10%).
    AdValorem { ad_valorem_rate: Option<Decimal> },
    /// Fixed amount per unit of quantity.
    Specific {
        specific_amount: Option<Decimal>,
        specific_unit: Option<String>,
    },
    /// Ad valorem plus specific.
    Compound {
        ad_valorem_rate: Option<Decimal>,
        specific_amount: Option<Decimal>,
        specific_unit: Option<String>,
    },
}

impl DutyRate {
    /// Build from the flat column layout used by rate tables.
    pub fn from_parts(
        rate_type: RateType,
        ad_valorem_rate: Option<Decimal>,
        specific_amount: Option<Decimal>,
        specific_unit: Option<String>,
    ) -> Self {
        match rate_type {
            RateType::AdValorem => DutyRate::AdValorem { ad_valorem_rate },
            RateType::Specific => DutyRate::Specific {
                specific_amount,
                specific_unit,
            },
            RateType::Compound => DutyRate::Compound {
                ad_valorem_rate,
                specific_amount,
                specific_unit,
            },
        }
    }

    pub fn ad_valorem(rate: Decimal) -> Self {
        DutyRate::AdValorem {
            ad_valorem_rate: Some(rate),
        }
    }

    pub fn specific(amount: Decimal, unit: impl Into<String>) -> Self {
        DutyRate::Specific {
            specific_amount: Some(amount),
            specific_unit: Some(unit.into()),
        }
    }

    pub fn compound(rate: Decimal, amount: Decimal, unit: impl Into<String>) -> Self {
        DutyRate::Compound {
            ad_valorem_rate: Some(rate),
            specific_amount: Some(amount),
            specific_unit: Some(unit.into()),
        }
    }

    pub fn rate_type(&self) -> RateType {
        match self {
            DutyRate::AdValorem { .. } => RateType::AdValorem,
            DutyRate::Specific { .. } => RateType::Specific,
            DutyRate::Compound { .. } => RateType::Compound,
        }
    }

    pub fn ad_valorem_rate(&self) -> Option<Decimal> {
        match self {
            DutyRate::AdValorem { ad_valorem_rate } => *ad_valorem_rate,
            DutyRate::Compound {
                ad_valorem_rate, ..
            } => *ad_valorem_rate,
            DutyRate::Specific { .. } => None,
        }
    }

    pub fn specific_amount(&self) -> Option<Decimal> {
        match self {
            DutyRate::Specific {
                specific_amount, ..
            }
            | DutyRate::Compound {
                specific_amount, ..
            } => *specific_amount,
            DutyRate::AdValorem { .. } => None,
        }
    }
}

/// One date-bounded tariff-rate record as returned by a rate store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateCandidate {
    pub id: Option<i64>,
    /// Importing country code.
    pub importer: String,
    /// Origin country code. None for MFN rows, which apply to every origin.
    pub origin: Option<String>,
    pub hs_code: String,
    pub basis: Basis,
    pub rate: DutyRate,
    pub valid_from: NaiveDate,
    /// Open-ended when None.
    pub valid_to: Option<NaiveDate>,
    pub agreement: Option<Agreement>,
    pub source_ref: Option<String>,
}

impl RateCandidate {
    /// True when `as_of` falls inside `[valid_from, valid_to]`.
    pub fn is_valid_on(&self, as_of: NaiveDate) -> bool {
        self.valid_from <= as_of && self.valid_to.map_or(true, |to| to >= as_of)
    }

    pub fn rate_type(&self) -> RateType {
        self.rate.rate_type()
    }

    /// The agreement's RVC threshold as a ratio, if this record carries one.
    pub fn rvc_threshold_ratio(&self) -> Option<Decimal> {
        self.agreement
            .as_ref()
            .and_then(Agreement::rvc_threshold_ratio)
    }
}

/// Query contract for rate stores: `(importer, origin?, hs_code, basis)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateQuery {
    pub importer: String,
    pub origin: Option<String>,
    pub hs_code: String,
    pub basis: Basis,
}

impl RateQuery {
    /// MFN rows are origin-independent.
    pub fn mfn(importer: &str, hs_code: &str) -> Self {
        Self {
            importer: importer.to_string(),
            origin: None,
            hs_code: hs_code.to_string(),
            basis: Basis::Mfn,
        }
    }

    pub fn preferential(importer: &str, origin: &str, hs_code: &str) -> Self {
        Self {
            importer: importer.to_string(),
            origin: Some(origin.to_string()),
            hs_code: hs_code.to_string(),
            basis: Basis::Pref,
        }
    }

    /// Whether a record answers this query. Country codes compare case-insensitively.
    pub fn matches(&self, candidate: &RateCandidate) -> bool {
        let origin_matches = match (&self.origin, &candidate.origin) {
            (None, None) => true,
            (Some(q), Some(c)) => q.eq_ignore_ascii_case(c),
            _ => false,
        };
        candidate.basis == self.basis
            && candidate.importer.eq_ignore_ascii_case(&self.importer)
            && candidate.hs_code == self.hs_code
            && origin_matches
    }

    /// Stable string form, used as a cache key.
    pub fn cache_key(&self) -> String {
        format!(
            "rates:{}:{}:{}:{}",
            self.basis,
            self.importer.to_ascii_uppercase(),
            self.origin
                .as_deref()
                .map(str::to_ascii_uppercase)
                .unwrap_or_else(|| "*".to_string()),
            self.hs_code
        )
    }
}
