//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger engine tuning.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
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
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Which dimension makes a cash register session unique while open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterScope {
    /// One open session per point-of-sale location.
    #[default]
    Location,
    /// One open session per operator.
    Operator,
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// How many times a post is attempted when it loses a concurrency race.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Largest accepted gap between the sum of payment legs and the total due.
    #[serde(default = "default_allocation_tolerance")]
    pub allocation_tolerance: Decimal,
    /// Uniqueness scope for open register sessions.
    #[serde(default)]
    pub register_scope: RegisterScope,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            allocation_tolerance: default_allocation_tolerance(),
            register_scope: RegisterScope::default(),
        }
    }
}

fn default_max_retries() -> u32 {
    5
}

fn default_allocation_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `TILLBOOK__SECTION__KEY` environment variables.
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
                config::Environment::with_prefix("TILLBOOK")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn from_toml(source: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_apply() {
        let cfg = from_toml(
            r#"
            [database]
            url = "sqlite::memory:"
            "#,
        );
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.ledger.max_retries, 5);
        assert_eq!(cfg.ledger.allocation_tolerance, dec!(0.01));
        assert_eq!(cfg.ledger.register_scope, RegisterScope::Location);
    }

    #[test]
    fn test_ledger_overrides() {
        let cfg = from_toml(
            r#"
            [database]
            url = "postgres://localhost/tillbook"

            [ledger]
            max_retries = 8
            allocation_tolerance = "0.05"
            register_scope = "operator"
            "#,
        );
        assert_eq!(cfg.ledger.max_retries, 8);
        assert_eq!(cfg.ledger.allocation_tolerance, dec!(0.05));
        assert_eq!(cfg.ledger.register_scope, RegisterScope::Operator);
    }
}
