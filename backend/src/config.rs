//! Configuration management for the Spice Ledger backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with SPICE_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::AlertThresholds;

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Log output format: "pretty" or "json"
    #[serde(default)]
    pub log_format: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Which record store backs the ledgers
    pub storage: StorageConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// PIN login configuration
    pub auth: AuthConfig,

    /// Alert thresholds
    pub alerts: AlertConfig,

    /// Dashboard feed sizes
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Apply pending migrations at startup
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,
}

/// Bcrypt hashes of the three role PINs
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub admin_pin_hash: Option<String>,
    pub manager_pin_hash: Option<String>,
    pub cook_pin_hash: Option<String>,

    /// Cost used when development PINs are hashed at startup
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertConfig {
    pub procurement_gap_warning_rub: Decimal,
    pub cost_per_contract_day_warning_rub: Decimal,
    pub cost_window_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Newest records taken from each source
    pub recent_per_source: i64,

    /// Length of the merged activity feed
    pub recent_activity_limit: usize,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("SPICE_ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let run_migrations = environment == "development";

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("log_format", "pretty")?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("storage.backend", "postgres")?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.run_migrations", run_migrations)?
            .set_default("jwt.access_token_expiry", 30i64 * 24 * 3600)?
            .set_default("auth.bcrypt_cost", bcrypt::DEFAULT_COST as i64)?
            .set_default("alerts.procurement_gap_warning_rub", "50000")?
            .set_default("alerts.cost_per_contract_day_warning_rub", "400")?
            .set_default("alerts.cost_window_days", 30)?
            .set_default("dashboard.recent_per_source", 5)?
            .set_default("dashboard.recent_activity_limit", 8)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (SPICE_ prefix)
            .add_source(
                Environment::with_prefix("SPICE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn alert_thresholds(&self) -> AlertThresholds {
        AlertThresholds {
            procurement_gap_warning_rub: self.alerts.procurement_gap_warning_rub,
            cost_per_contract_day_warning_rub: self.alerts.cost_per_contract_day_warning_rub,
            cost_window_days: self.alerts.cost_window_days,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 2,
            run_migrations: false,
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "development-secret-key".to_string(),
            access_token_expiry: 30 * 24 * 3600,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_pin_hash: None,
            manager_pin_hash: None,
            cook_pin_hash: None,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        let defaults = AlertThresholds::default();
        Self {
            procurement_gap_warning_rub: defaults.procurement_gap_warning_rub,
            cost_per_contract_day_warning_rub: defaults.cost_per_contract_day_warning_rub,
            cost_window_days: defaults.cost_window_days,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_per_source: 5,
            recent_activity_limit: 8,
        }
    }
}
