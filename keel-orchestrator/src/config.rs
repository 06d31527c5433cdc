//! Orchestrator configuration
//!
//! Bind address and optional database connection settings. Without a
//! database URL the orchestrator keeps its state in memory.

use std::time::Duration;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API listens on (e.g., "0.0.0.0:8080")
    pub bind_addr: String,

    /// PostgreSQL settings; `None` selects the in-memory store
    pub database: Option<DatabaseConfig>,
}

/// Connection pool settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: String) -> Self {
        Self {
            url,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - ORCHESTRATOR_BIND_ADDR (optional, default: 0.0.0.0:8080)
    /// - DATABASE_URL (optional; in-memory store when unset)
    /// - DATABASE_MAX_CONNECTIONS (optional, default: 10)
    /// - DATABASE_ACQUIRE_TIMEOUT (optional, seconds, default: 5)
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr =
            std::env::var("ORCHESTRATOR_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let database = match std::env::var("DATABASE_URL") {
            Ok(url) => {
                let mut db = DatabaseConfig::new(url);

                if let Ok(raw) = std::env::var("DATABASE_MAX_CONNECTIONS") {
                    db.max_connections = raw.parse().map_err(|_| {
                        anyhow::anyhow!("DATABASE_MAX_CONNECTIONS must be a number, got {:?}", raw)
                    })?;
                }

                if let Ok(raw) = std::env::var("DATABASE_ACQUIRE_TIMEOUT") {
                    let secs: u64 = raw.parse().map_err(|_| {
                        anyhow::anyhow!("DATABASE_ACQUIRE_TIMEOUT must be seconds, got {:?}", raw)
                    })?;
                    db.acquire_timeout = Duration::from_secs(secs);
                }

                Some(db)
            }
            Err(_) => None,
        };

        Ok(Self {
            bind_addr,
            database,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.trim().is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if let Some(db) = &self.database {
            if db.url.trim().is_empty() {
                anyhow::bail!("DATABASE_URL cannot be empty");
            }

            if db.max_connections == 0 {
                anyhow::bail!("max_connections must be greater than 0");
            }

            if db.acquire_timeout.is_zero() {
                anyhow::bail!("acquire_timeout must be greater than 0");
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            database: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(config.database.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.bind_addr = " ".to_string();
        assert!(config.validate().is_err());

        config.bind_addr = "127.0.0.1:9000".to_string();
        config.database = Some(DatabaseConfig::new("postgres://keel@localhost/keel".to_string()));
        assert!(config.validate().is_ok());

        if let Some(db) = config.database.as_mut() {
            db.max_connections = 0;
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_defaults() {
        let db = DatabaseConfig::new("postgres://localhost/keel".to_string());
        assert_eq!(db.max_connections, 10);
        assert_eq!(db.acquire_timeout, Duration::from_secs(5));
    }
}
