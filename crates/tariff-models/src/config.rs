use serde::{Deserialize, Serialize};

/// Top-level configuration for the tariff engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TariffConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Where candidate rates are read from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Read-only SQLite rate tables.
    #[default]
    Sqlite,
    /// A JSON array of rate candidates loaded into memory.
    Json,
}

/// Configuration for the rate store layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Path to the SQLite rate database (backend = "sqlite").
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
    /// Path to a JSON rate file (backend = "json").
    pub json_path: Option<String>,
    /// Maximum number of cached queries in the moka cache. 0 disables caching.
    #[serde(default = "default_memory_max_capacity")]
    pub memory_max_capacity: u64,
    /// How long a cached query result stays in memory.
    #[serde(default = "default_memory_ttl")]
    pub memory_ttl_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            sqlite_path: default_sqlite_path(),
            json_path: None,
            memory_max_capacity: default_memory_max_capacity(),
            memory_ttl_seconds: default_memory_ttl(),
        }
    }
}

/// What to do when a SPECIFIC or COMPOUND rate meets a request without a quantity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingQuantityPolicy {
    /// The specific component contributes zero duty.
    #[default]
    Zero,
    /// Fail with an invalid-input error.
    Reject,
}

/// Numeric and policy settings for the calculation engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub missing_quantity: MissingQuantityPolicy,
    /// Decimal places kept on the RVC ratio.
    #[serde(default = "default_rvc_scale")]
    pub rvc_scale: u32,
    /// Decimal places kept on the final duty.
    #[serde(default = "default_duty_scale")]
    pub duty_scale: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            missing_quantity: MissingQuantityPolicy::default(),
            rvc_scale: default_rvc_scale(),
            duty_scale: default_duty_scale(),
        }
    }
}

fn default_sqlite_path() -> String {
    "data/tariff_rates.db".to_string()
}
fn default_memory_max_capacity() -> u64 {
    10_000
}
fn default_memory_ttl() -> u64 {
    300
}
fn default_rvc_scale() -> u32 {
    6
}
fn default_duty_scale() -> u32 {
    2
}
