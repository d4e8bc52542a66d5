use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cost and quantity inputs for one shipment, all in a single currency.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CalculationRequest {
    /// Unit count. Only SPECIFIC and COMPOUND rates use it.
    pub quantity: Option<u32>,
    /// Customs value, the base for ad valorem duty.
    pub total_value: Decimal,
    #[serde(default)]
    pub material_cost: Decimal,
    #[serde(default)]
    pub labour_cost: Decimal,
    #[serde(default)]
    pub overhead_cost: Decimal,
    #[serde(default)]
    pub profit: Decimal,
    #[serde(default)]
    pub other_costs: Decimal,
    /// Free-on-board value, the RVC denominator.
    #[serde(alias = "FOB")]
    pub fob: Option<Decimal>,
}

impl CalculationRequest {
    /// RVC numerator: material + labour + overhead + profit + other costs.
    ///
    /// None when the sum overflows `Decimal`.
    pub fn originating_costs(&self) -> Option<Decimal> {
        [self.labour_cost, self.overhead_cost, self.profit, self.other_costs]
            .into_iter()
            .try_fold(self.material_cost, |sum, cost| sum.checked_add(cost))
    }

    /// Name of the first monetary field holding a negative value, if any.
    pub fn first_negative_field(&self) -> Option<&'static str> {
        let fields = [
            ("total_value", Some(self.total_value)),
            ("material_cost", Some(self.material_cost)),
            ("labour_cost", Some(self.labour_cost)),
            ("overhead_cost", Some(self.overhead_cost)),
            ("profit", Some(self.profit)),
            ("other_costs", Some(self.other_costs)),
            ("fob", self.fob),
        ];
        fields
            .into_iter()
            .find(|(_, value)| value.is_some_and(|v| v.is_sign_negative() && !v.is_zero()))
            .map(|(name, _)| name)
    }
}

/// Everything the calculation entry point needs for one shipment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalculationInput {
    pub importer: String,
    /// Origin country. Without it only the MFN basis is considered.
    pub origin: Option<String>,
    pub hs_code: String,
    /// Reference date for rate validity. Defaults to today (UTC) when omitted.
    #[serde(default = "today")]
    pub as_of: NaiveDate,
    pub request: CalculationRequest,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
