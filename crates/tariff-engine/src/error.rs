use chrono::NaiveDate;
use tariff_models::rate::RateQuery;
use tariff_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// No applicable MFN rate. Always fatal.
    #[error("No applicable {} rate for {} as of {as_of}", .query.basis, .query.cache_key())]
    NotFound { query: RateQuery, as_of: NaiveDate },

    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rate store error: {0}")]
    Store(StoreError),
}

impl EngineError {
    pub fn not_found(query: &RateQuery, as_of: NaiveDate) -> Self {
        EngineError::NotFound {
            query: query.clone(),
            as_of,
        }
    }

    /// Decimal arithmetic on `what` left the representable range.
    pub fn out_of_range(what: &str) -> Self {
        EngineError::InvalidInput(format!("{what} exceeds representable range"))
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidRate(msg) => EngineError::InvalidRate(msg),
            other => EngineError::Store(other),
        }
    }
}
