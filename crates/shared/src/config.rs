//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger engine configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Isolation level for ledger units of work.
    #[serde(default)]
    pub isolation: IsolationSetting,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Transaction isolation level requested for ledger units of work.
///
/// Mutated rows are always locked with `SELECT ... FOR UPDATE`, so
/// `ReadCommitted` is sufficient for pair consistency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationSetting {
    /// `READ COMMITTED`.
    #[default]
    ReadCommitted,
    /// `REPEATABLE READ`.
    RepeatableRead,
    /// `SERIALIZABLE`.
    Serializable,
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Candidate hub currencies for rate triangulation, tried in order.
    #[serde(default = "default_hub_currencies")]
    pub hub_currencies: Vec<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            hub_currencies: default_hub_currencies(),
        }
    }
}

fn default_hub_currencies() -> Vec<String> {
    ["USD", "EUR", "GBP", "JPY", "CHF"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("TALLY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("ledger.hub_currencies")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
