use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use tariff_models::config::EngineConfig;
use tariff_models::rate::{RateCandidate, RateQuery};
use tariff_models::request::{CalculationInput, CalculationRequest};
use tariff_models::result::{CalculationResult, RateLookup};
use tariff_store::RateStore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::duty::compute_duty;
use crate::error::EngineError;
use crate::qualification::decide_basis;
use crate::selector::select_applicable;

/// The calculator resolves rates from a store and produces a CalculationResult.
///
/// Holds no per-call state; share it through `Arc` and call it concurrently.
pub struct Calculator {
    store: Arc<dyn RateStore>,
    config: EngineConfig,
}

/// The MFN and (optional) preferential rates in force for one lookup.
struct ResolvedRates {
    mfn: RateCandidate,
    pref: Option<RateCandidate>,
}

impl Calculator {
    pub fn new(store: Arc<dyn RateStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute the duty for one shipment.
    ///
    /// 1. resolve the MFN rate (fatal when missing)
    /// 2. resolve the preferential rate if an origin was given
    /// 3. decide the basis through the RVC test
    /// 4. compute duty under the chosen rate
    pub async fn calculate(&self, input: &CalculationInput) -> Result<CalculationResult, EngineError> {
        let start = Instant::now();
        info!(
            importer = %input.importer,
            origin = ?input.origin,
            hs_code = %input.hs_code,
            as_of = %input.as_of,
            "Starting duty calculation"
        );

        validate_request(&input.request)?;

        let rates = self
            .resolve(
                &input.importer,
                input.origin.as_deref(),
                &input.hs_code,
                input.as_of,
            )
            .await?;

        let decision = decide_basis(
            &rates.mfn,
            rates.pref.as_ref(),
            &input.request,
            self.config.rvc_scale,
        )?;
        let total_duty = compute_duty(decision.applied, &input.request, &self.config)?;

        let result = CalculationResult {
            calculation_id: Uuid::new_v4(),
            calculated_at: Utc::now(),
            as_of: input.as_of,
            basis_applied: decision.basis,
            applied_rate: decision.applied.clone(),
            rvc_computed: decision.rvc_computed,
            rvc_threshold: decision.rvc_threshold,
            total_duty,
        };

        info!(
            basis = %result.basis_applied,
            rate_type = %result.applied_rate.rate_type(),
            total_duty = %result.total_duty,
            rvc = ?result.rvc_computed,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Duty calculation complete"
        );

        Ok(result)
    }

    /// Rates in force for an importer/origin/HS code without computing a duty.
    pub async fn lookup(
        &self,
        importer: &str,
        origin: Option<&str>,
        hs_code: &str,
        as_of: NaiveDate,
    ) -> Result<RateLookup, EngineError> {
        let ResolvedRates { mfn, pref } = self.resolve(importer, origin, hs_code, as_of).await?;
        let agreement = pref.as_ref().and_then(|p| p.agreement.clone());
        Ok(RateLookup {
            as_of,
            mfn,
            pref,
            agreement,
        })
    }

    async fn resolve(
        &self,
        importer: &str,
        origin: Option<&str>,
        hs_code: &str,
        as_of: NaiveDate,
    ) -> Result<ResolvedRates, EngineError> {
        let mfn_query = RateQuery::mfn(importer, hs_code);
        let mfn_candidates = self.store.find_candidates(&mfn_query).await?;
        let mfn = select_applicable(&mfn_candidates, as_of)
            .cloned()
            .ok_or_else(|| {
                warn!(key = %mfn_query.cache_key(), %as_of, "No applicable MFN rate");
                EngineError::not_found(&mfn_query, as_of)
            })?;
        debug!(rate_id = ?mfn.id, candidates = mfn_candidates.len(), "MFN rate selected");

        let pref = match origin {
            Some(origin) => {
                let pref_query = RateQuery::preferential(importer, origin, hs_code);
                let pref_candidates = self.store.find_candidates(&pref_query).await?;
                let pref = select_applicable(&pref_candidates, as_of).cloned();
                debug!(
                    rate_id = ?pref.as_ref().and_then(|p| p.id),
                    candidates = pref_candidates.len(),
                    "Preferential rate lookup done"
                );
                pref
            }
            None => {
                debug!("No origin given; skipping preferential lookup");
                None
            }
        };

        Ok(ResolvedRates { mfn, pref })
    }
}

/// Monetary inputs must be non-negative.
fn validate_request(req: &CalculationRequest) -> Result<(), EngineError> {
    match req.first_negative_field() {
        Some(field) => Err(EngineError::InvalidInput(format!(
            "{field} must not be negative"
        ))),
        None => Ok(()),
    }
}
