use rust_decimal::Decimal;
use tariff_models::rate::{Basis, RateCandidate};
use tariff_models::request::CalculationRequest;
use tracing::debug;

use crate::error::EngineError;
use crate::rounding::ratio;

/// Which basis won, and the numbers that decided it.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisDecision<'a> {
    pub basis: Basis,
    pub applied: &'a RateCandidate,
    /// None when FOB is absent or zero.
    pub rvc_computed: Option<Decimal>,
    /// Threshold ratio tested against, when the preferential agreement defines one.
    pub rvc_threshold: Option<Decimal>,
}

/// Regional Value Content: originating costs / FOB, rounded half-up at `scale`.
///
/// None when FOB is absent or zero. Fails when the costs overflow `Decimal`.
pub fn compute_rvc(
    req: &CalculationRequest,
    scale: u32,
) -> Result<Option<Decimal>, EngineError> {
    let Some(fob) = req.fob.filter(|fob| !fob.is_zero()) else {
        return Ok(None);
    };
    let numerator = req
        .originating_costs()
        .ok_or_else(|| EngineError::out_of_range("originating costs"))?;
    ratio(numerator, fob, scale)
        .map(Some)
        .ok_or_else(|| EngineError::out_of_range("regional value content"))
}

/// Decide between the MFN and preferential rate for a shipment.
///
/// RVC is computed whenever FOB allows it, even when the preferential path is never
/// reached. PREF applies only when a preferential rate exists, its agreement carries an
/// RVC threshold, and `rvc >= threshold`. A missing threshold counts as not qualifying.
pub fn decide_basis<'a>(
    mfn: &'a RateCandidate,
    pref: Option<&'a RateCandidate>,
    req: &CalculationRequest,
    rvc_scale: u32,
) -> Result<BasisDecision<'a>, EngineError> {
    let rvc_computed = compute_rvc(req, rvc_scale)?;
    let mfn_decision = |rvc_threshold| BasisDecision {
        basis: Basis::Mfn,
        applied: mfn,
        rvc_computed,
        rvc_threshold,
    };

    let Some(pref) = pref else {
        debug!(rvc = ?rvc_computed, "No preferential rate; applying MFN");
        return Ok(mfn_decision(None));
    };

    let Some(threshold) = pref.rvc_threshold_ratio() else {
        debug!(
            agreement_id = ?pref.agreement.as_ref().and_then(|a| a.id),
            "Agreement has no RVC threshold; applying MFN"
        );
        return Ok(mfn_decision(None));
    };

    let rvc = rvc_computed.ok_or_else(|| {
        EngineError::InvalidInput(
            "fob must be present and non-zero to test regional value content".to_string(),
        )
    })?;

    if rvc >= threshold {
        debug!(%rvc, %threshold, "Origin qualifies; applying PREF");
        Ok(BasisDecision {
            basis: Basis::Pref,
            applied: pref,
            rvc_computed,
            rvc_threshold: Some(threshold),
        })
    } else {
        debug!(%rvc, %threshold, "RVC below threshold; applying MFN");
        Ok(mfn_decision(Some(threshold)))
    }
}
