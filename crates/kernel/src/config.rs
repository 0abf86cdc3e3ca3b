//! Configuration loaded from environment variables.

use std::env;

use crate::error::{Error, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Callers that want `.env` support should load it (e.g. with
    /// `dotenvy::dotenv()`) before calling this.
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| Error::Config("DATABASE_URL environment variable is required".into()))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| Error::Config("DATABASE_MAX_CONNECTIONS must be a valid u32".into()))?;

        Ok(Self {
            database_url,
            database_max_connections,
        })
    }
}
