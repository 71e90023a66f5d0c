//! Server configuration, loaded from environment variables with fallback to
//! defaults. A local `.env` file is honored in development (see `main`).

use std::env;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port.
    pub port: u16,

    /// Address to bind, e.g. "0.0.0.0" or "127.0.0.1".
    pub bind_address: String,

    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum database pool connections.
    pub db_max_connections: u32,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            port: env::var("KHATA_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("KHATA_PORT".to_string()))?,

            bind_address: env::var("KHATA_BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),

            database_path: env::var("KHATA_DATABASE_PATH")
                .unwrap_or_else(|_| "khata.db".to_string())
                .into(),

            db_max_connections: env::var("KHATA_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("KHATA_DB_MAX_CONNECTIONS".to_string()))?,
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Only read defaults we control; CI may set unrelated vars
        std::env::remove_var("KHATA_PORT");
        std::env::remove_var("KHATA_BIND_ADDRESS");
        std::env::remove_var("KHATA_DATABASE_PATH");
        std::env::remove_var("KHATA_DB_MAX_CONNECTIONS");

        let config = ServerConfig::load().unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.database_path, PathBuf::from("khata.db"));
        assert_eq!(config.db_max_connections, 5);
    }
}
