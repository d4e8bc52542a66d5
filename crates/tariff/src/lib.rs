//! Tariff duty calculation.
//!
//! Resolves the MFN and preferential rates in force for an importer, origin and HS
//! code, decides the basis through the regional value content test, and computes
//! the duty owed.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use tariff::models::config::TariffConfig;
//! use tariff::models::request::CalculationInput;
//! use tariff::engine::Calculator;
//! use tariff::store::{CachedRateStore, RateStore, SqliteRateStore};
//! ```

pub use tariff_engine as engine;
pub use tariff_models as models;
pub use tariff_store as store;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tariff_engine::{Calculator, EngineError};
use tariff_models::config::{StoreBackend, StoreConfig, TariffConfig};
use tariff_models::request::CalculationInput;
use tariff_models::result::CalculationResult;
use tariff_store::{CachedRateStore, MemoryRateStore, RateStore, SqliteRateStore};
use tracing::info;

/// Build the rate store described by configuration, behind the moka cache unless
/// `memory_max_capacity` is 0.
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn RateStore>, anyhow::Error> {
    let backing: Arc<dyn RateStore> = match config.backend {
        StoreBackend::Sqlite => Arc::new(
            SqliteRateStore::open(&config.sqlite_path)
                .with_context(|| format!("Failed to open rate database: {}", config.sqlite_path))?,
        ),
        StoreBackend::Json => {
            let path = config
                .json_path
                .as_deref()
                .context("store.json_path is required for the json backend")?;
            let store = MemoryRateStore::from_json_file(path)
                .with_context(|| format!("Failed to load rate file: {path}"))?;
            info!(path, rates = store.len(), "Loaded rate file");
            Arc::new(store)
        }
    };

    if config.memory_max_capacity == 0 {
        return Ok(backing);
    }
    Ok(Arc::new(CachedRateStore::new(
        backing,
        config.memory_max_capacity,
        Duration::from_secs(config.memory_ttl_seconds),
    )))
}

/// Build a Calculator from configuration.
pub fn build_calculator(config: &TariffConfig) -> Result<Calculator, anyhow::Error> {
    let store = build_store(&config.store)?;
    Ok(Calculator::new(store, config.engine.clone()))
}

/// Calculate the duty for one shipment using the given calculator.
pub async fn calculate(
    calculator: &Calculator,
    input: &CalculationInput,
) -> Result<CalculationResult, EngineError> {
    calculator.calculate(input).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tariff_models::rate::Basis;

    const RATES_JSON: &str = r#"[
        {
            "importer": "US",
            "hs_code": "87038010",
            "basis": "MFN",
            "rate": {"rate_type": "ad_valorem", "ad_valorem_rate": "0.055"},
            "valid_from": "2017-01-01"
        },
        {
            "importer": "US",
            "origin": "CL",
            "hs_code": "87038010",
            "basis": "PREF",
            "rate": {"rate_type": "ad_valorem", "ad_valorem_rate": "0.000"},
            "valid_from": "2017-01-01",
            "agreement": {"name": "US-Chile FTA", "status": "in_force", "rvc_threshold": "30.00"}
        }
    ]"#;

    const INPUT_JSON: &str = r#"{
        "importer": "US",
        "origin": "CL",
        "hs_code": "87038010",
        "as_of": "2024-03-01",
        "request": {
            "quantity": 100,
            "total_value": "1000.00",
            "material_cost": "50",
            "labour_cost": "10",
            "overhead_cost": "5",
            "profit": "5",
            "other_costs": "0",
            "fob": "100"
        }
    }"#;

    fn json_config(file: &tempfile::NamedTempFile, capacity: u64) -> TariffConfig {
        let mut config = TariffConfig::default();
        config.store.backend = StoreBackend::Json;
        config.store.json_path = Some(file.path().to_string_lossy().into_owned());
        config.store.memory_max_capacity = capacity;
        config
    }

    fn rates_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RATES_JSON.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn json_backend_end_to_end() {
        let file = rates_file();
        let config = json_config(&file, 100);
        let calculator = build_calculator(&config).unwrap();
        assert_eq!(calculator.config(), &config.engine);
        let input: CalculationInput = serde_json::from_str(INPUT_JSON).unwrap();

        let result = calculate(&calculator, &input).await.unwrap();
        assert_eq!(result.basis_applied, Basis::Pref);
        assert_eq!(result.rvc_computed, Some(dec!(0.700000)));
        assert_eq!(result.total_duty.to_string(), "0.00");

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["basis_applied"], "PREF");
        assert_eq!(json["total_duty"], "0.00");
    }

    #[tokio::test]
    async fn zero_capacity_skips_the_cache() {
        let file = rates_file();
        let store = build_store(&json_config(&file, 0).store).unwrap();
        assert_eq!(store.name(), "memory");

        let store = build_store(&json_config(&file, 10).store).unwrap();
        assert_eq!(store.name(), "cached");
    }

    #[test]
    fn bundled_samples_parse() {
        let config: TariffConfig =
            toml::from_str(include_str!("../../../config/tariff.toml")).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Json);
        assert_eq!(config.engine.duty_scale, 2);

        let rates = MemoryRateStore::from_json_str(include_str!("../../../config/rates.sample.json"))
            .unwrap();
        assert_eq!(rates.len(), 3);

        let input: CalculationInput =
            serde_json::from_str(include_str!("../../../config/shipment.sample.json")).unwrap();
        assert_eq!(input.origin.as_deref(), Some("CL"));
    }

    #[test]
    fn json_backend_requires_a_path() {
        let mut config = TariffConfig::default();
        config.store.backend = StoreBackend::Json;
        let err = build_store(&config.store).err().unwrap();
        assert!(err.to_string().contains("json_path"));
    }

    #[test]
    fn missing_sqlite_database_is_an_error() {
        let mut config = TariffConfig::default();
        config.store.sqlite_path = "/nonexistent/dir/rates.db".to_string();
        assert!(build_store(&config.store).is_err());
    }
}
