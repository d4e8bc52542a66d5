pub mod config;
pub mod rate;
pub mod rate_schema;
pub mod request;
pub mod result;

pub use config::{EngineConfig, MissingQuantityPolicy, StoreBackend, StoreConfig, TariffConfig};
pub use rate::{
    Agreement, AgreementStatus, Basis, DutyRate, RateCandidate, RateQuery, RateType,
    UnknownVariant,
};
pub use rate_schema::{AgreementRow, RateRow};
pub use request::{CalculationInput, CalculationRequest};
pub use result::{CalculationResult, RateLookup};
