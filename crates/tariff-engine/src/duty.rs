use rust_decimal::Decimal;
use tariff_models::config::{EngineConfig, MissingQuantityPolicy};
use tariff_models::rate::{DutyRate, RateCandidate};
use tariff_models::request::CalculationRequest;

use crate::error::EngineError;
use crate::rounding::round_half_up;

/// Total duty owed under `rate`, rounded half-up at `config.duty_scale`.
///
/// - ad valorem: `total_value * ad_valorem_rate`
/// - specific: `specific_amount * quantity`
/// - compound: the sum of both
///
/// A component whose rate field is absent contributes zero. A missing quantity also
/// contributes zero unless the policy is `Reject`.
pub fn compute_duty(
    rate: &RateCandidate,
    req: &CalculationRequest,
    config: &EngineConfig,
) -> Result<Decimal, EngineError> {
    check_rate_fields(rate)?;

    let duty = match &rate.rate {
        DutyRate::AdValorem { ad_valorem_rate } => ad_valorem_component(*ad_valorem_rate, req)?,
        DutyRate::Specific {
            specific_amount, ..
        } => specific_component(*specific_amount, req, config.missing_quantity)?,
        DutyRate::Compound {
            ad_valorem_rate,
            specific_amount,
            ..
        } => ad_valorem_component(*ad_valorem_rate, req)?
            .checked_add(specific_component(*specific_amount, req, config.missing_quantity)?)
            .ok_or_else(|| EngineError::out_of_range("duty amount"))?,
    };

    Ok(round_half_up(duty, config.duty_scale))
}

fn ad_valorem_component(
    rate: Option<Decimal>,
    req: &CalculationRequest,
) -> Result<Decimal, EngineError> {
    let Some(rate) = rate else {
        return Ok(Decimal::ZERO);
    };
    req.total_value
        .checked_mul(rate)
        .ok_or_else(|| EngineError::out_of_range("ad valorem duty"))
}

fn specific_component(
    amount: Option<Decimal>,
    req: &CalculationRequest,
    policy: MissingQuantityPolicy,
) -> Result<Decimal, EngineError> {
    let Some(amount) = amount else {
        return Ok(Decimal::ZERO);
    };
    match (req.quantity, policy) {
        (Some(quantity), _) => amount
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| EngineError::out_of_range("specific duty")),
        (None, MissingQuantityPolicy::Zero) => Ok(Decimal::ZERO),
        (None, MissingQuantityPolicy::Reject) => Err(EngineError::InvalidInput(
            "quantity is required for a specific duty".to_string(),
        )),
    }
}

/// Rates and amounts cannot be negative.
fn check_rate_fields(rate: &RateCandidate) -> Result<(), EngineError> {
    let fields = [
        ("ad_valorem_rate", rate.rate.ad_valorem_rate()),
        ("specific_amount", rate.rate.specific_amount()),
    ];
    for (name, value) in fields {
        if let Some(v) = value.filter(|v| v.is_sign_negative() && !v.is_zero()) {
            return Err(EngineError::InvalidRate(format!(
                "{} rate {:?} has negative {name} {v}",
                rate.rate_type(),
                rate.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mfn_rate;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn rate(duty_rate: DutyRate) -> RateCandidate {
        mfn_rate(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), duty_rate)
    }

    fn request(total_value: Decimal, quantity: Option<u32>) -> CalculationRequest {
        CalculationRequest {
            quantity,
            total_value,
            ..CalculationRequest::default()
        }
    }

    fn duty(duty_rate: DutyRate, req: &CalculationRequest) -> Result<Decimal, EngineError> {
        compute_duty(&rate(duty_rate), req, &EngineConfig::default())
    }

    #[test]
    fn ad_valorem_multiplies_value() {
        let req = request(dec!(1000.00), None);
        assert_eq!(duty(DutyRate::ad_valorem(dec!(0.10)), &req).unwrap(), dec!(100.00));
    }

    #[test]
    fn specific_multiplies_quantity() {
        let req = request(dec!(1000.00), Some(40));
        assert_eq!(
            duty(DutyRate::specific(dec!(2.50), "kg"), &req).unwrap(),
            dec!(100.00)
        );
    }

    #[test]
    fn compound_sums_both_components() {
        let req = request(dec!(1000.00), Some(40));
        assert_eq!(
            duty(DutyRate::compound(dec!(0.10), dec!(2.50), "kg"), &req).unwrap(),
            dec!(200.00)
        );
    }

    #[test]
    fn duty_is_rounded_half_up_to_cents() {
        let req = request(dec!(10.10), None);
        // 10.10 * 0.055 = 0.5555
        let amount = duty(DutyRate::ad_valorem(dec!(0.055)), &req).unwrap();
        assert_eq!(amount, dec!(0.56));
        assert_eq!(amount.to_string(), "0.56");

        let req = request(dec!(1000), None);
        assert_eq!(
            duty(DutyRate::ad_valorem(dec!(0.10)), &req).unwrap().to_string(),
            "100.00"
        );
    }

    #[test]
    fn absent_ad_valorem_rate_is_free() {
        let req = request(dec!(1000), None);
        let free = DutyRate::AdValorem {
            ad_valorem_rate: None,
        };
        assert_eq!(duty(free, &req).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn missing_quantity_defaults_to_zero() {
        let req = request(dec!(1000), None);
        assert_eq!(
            duty(DutyRate::specific(dec!(2.50), "kg"), &req).unwrap(),
            Decimal::ZERO
        );
        // Compound keeps its ad valorem part
        assert_eq!(
            duty(DutyRate::compound(dec!(0.10), dec!(2.50), "kg"), &req).unwrap(),
            dec!(100.00)
        );
    }

    #[test]
    fn missing_quantity_can_be_rejected() {
        let config = EngineConfig {
            missing_quantity: MissingQuantityPolicy::Reject,
            ..EngineConfig::default()
        };
        let req = request(dec!(1000), None);

        let err = compute_duty(&rate(DutyRate::specific(dec!(2.50), "kg")), &req, &config)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));

        // Ad valorem never needs a quantity
        assert_eq!(
            compute_duty(&rate(DutyRate::ad_valorem(dec!(0.10))), &req, &config).unwrap(),
            dec!(100.00)
        );
    }

    #[test]
    fn compound_with_nothing_populated_is_zero() {
        let req = request(dec!(1000), Some(10));
        let empty = DutyRate::Compound {
            ad_valorem_rate: None,
            specific_amount: None,
            specific_unit: None,
        };
        assert_eq!(duty(empty, &req).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn overflowing_specific_duty_is_invalid_input() {
        let req = request(dec!(1000), Some(4_000_000_000));
        let err = duty(DutyRate::specific(Decimal::from_i128_with_scale(10i128.pow(20), 0), "kg"), &req).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn overflowing_ad_valorem_and_compound_duty_are_invalid_input() {
        let req = request(Decimal::MAX, Some(1));
        let err = duty(DutyRate::ad_valorem(dec!(2)), &req).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));

        // Each component fits on its own, the sum does not
        let err = duty(DutyRate::compound(Decimal::ONE, Decimal::MAX, "kg"), &req).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn negative_rate_is_invalid() {
        let req = request(dec!(1000), Some(10));
        let err = duty(DutyRate::ad_valorem(dec!(-0.10)), &req).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRate(_)));

        let err = duty(DutyRate::specific(dec!(-1), "kg"), &req).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRate(_)));
    }
}
