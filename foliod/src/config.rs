//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{ServiceError, ServiceResult};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Portfolio policy configuration
    pub portfolio: PortfolioConfig,

    /// Report writer configuration
    pub report: ReportConfig,

    /// Database connection string (used by the postgres store)
    pub database_url: String,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Portfolio policy configuration.
#[derive(Debug, Clone)]
pub struct PortfolioConfig {
    /// Lower bound of an acceptable target-portfolio weight sum (99.99)
    pub weight_sum_min: Decimal,
    /// Upper bound of an acceptable target-portfolio weight sum (100.01)
    pub weight_sum_max: Decimal,
}

/// Report writer configuration.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Where the markdown index report is written
    pub output_path: String,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment (in-memory store)
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> ServiceResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let environment = Self::load_environment()?;
        let api = Self::load_api_config()?;
        let portfolio = Self::load_portfolio_config()?;
        let report = ReportConfig {
            output_path: env::var("FOLIO_REPORT_PATH")
                .unwrap_or_else(|_| "folio-index.md".to_string()),
        };
        let database_url = env::var("FOLIO_DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/folio".to_string());

        Ok(Self {
            api,
            portfolio,
            report,
            database_url,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            portfolio: PortfolioConfig::default(),
            report: ReportConfig {
                output_path: "folio-index.md".to_string(),
            },
            database_url: "postgres://localhost/folio_test".to_string(),
            environment: Environment::Test,
        }
    }

    fn load_environment() -> ServiceResult<Environment> {
        let env_str = env::var("FOLIO_ENV").unwrap_or_else(|_| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ServiceError::Config(format!(
                "Invalid FOLIO_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_api_config() -> ServiceResult<ApiConfig> {
        let host = env::var("FOLIO_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port_str = env::var("FOLIO_API_PORT").unwrap_or_else(|_| "8080".to_string());

        let port = port_str
            .parse::<u16>()
            .map_err(|_| ServiceError::Config(format!("Invalid FOLIO_API_PORT: {}", port_str)))?;

        Ok(ApiConfig { host, port })
    }

    fn load_portfolio_config() -> ServiceResult<PortfolioConfig> {
        let weight_sum_min = Self::load_decimal_env(
            "FOLIO_WEIGHT_SUM_MIN",
            Decimal::new(9999, 2), // 99.99
        )?;

        let weight_sum_max = Self::load_decimal_env(
            "FOLIO_WEIGHT_SUM_MAX",
            Decimal::new(10001, 2), // 100.01
        )?;

        Ok(PortfolioConfig {
            weight_sum_min,
            weight_sum_max,
        })
    }

    fn load_decimal_env(key: &str, default: Decimal) -> ServiceResult<Decimal> {
        match env::var(key) {
            Ok(val) => Decimal::from_str(&val)
                .map_err(|_| ServiceError::Config(format!("Invalid {} value: {}", key, val))),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            portfolio: PortfolioConfig::default(),
            report: ReportConfig {
                output_path: "folio-index.md".to_string(),
            },
            database_url: "postgres://localhost/folio".to_string(),
            environment: Environment::Development,
        }
    }
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            weight_sum_min: Decimal::new(9999, 2),  // 99.99
            weight_sum_max: Decimal::new(10001, 2), // 100.01
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
