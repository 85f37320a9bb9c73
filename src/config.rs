//! Configuration for RedditorStore
//!
//! Provides a builder pattern for configuring the store, plus loading from
//! the process environment (and a `.env` file, if present).

use crate::error::{Result, StoreError};

/// Default size of the connection pool
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuration for the store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// PostgreSQL database URL
    pub database_url: String,
    /// Maximum number of pooled connections (default: 5)
    pub max_connections: u32,
    /// Whether to create tables, triggers and trigger functions on connect (default: true)
    pub create_tables: bool,
    /// Role that should own the created tables and functions (default: none)
    pub table_owner: Option<String>,
}

impl StoreConfig {
    /// Create a new configuration builder
    pub fn builder(database_url: impl Into<String>) -> StoreConfigBuilder {
        StoreConfigBuilder::new(database_url)
    }

    /// Load configuration from the environment
    ///
    /// Reads a `.env` file first if one exists, then:
    /// - `DATABASE_URL` (required)
    /// - `DATABASE_MAX_CONNECTIONS` (optional, positive integer)
    /// - `PGUSER` (optional, becomes the table owner)
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine; variables may come from the process
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or_else(|| StoreError::config("DATABASE_URL is not set"))?;

        let mut builder = StoreConfigBuilder::new(database_url);

        if let Some(raw) = lookup("DATABASE_MAX_CONNECTIONS") {
            let max = raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    StoreError::config(format!(
                        "DATABASE_MAX_CONNECTIONS must be a positive integer, got '{}'",
                        raw
                    ))
                })?;
            builder = builder.max_connections(max);
        }

        if let Some(owner) = lookup("PGUSER").filter(|o| !o.is_empty()) {
            builder = builder.table_owner(owner);
        }

        Ok(builder.build())
    }
}

/// Builder for StoreConfig
#[derive(Debug)]
pub struct StoreConfigBuilder {
    database_url: String,
    max_connections: u32,
    create_tables: bool,
    table_owner: Option<String>,
}

impl StoreConfigBuilder {
    /// Create a new builder with the database URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            create_tables: true,
            table_owner: None,
        }
    }

    /// Set the maximum pool size (default: 5)
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Enable or disable table bootstrap on connect (default: true)
    pub fn create_tables(mut self, enabled: bool) -> Self {
        self.create_tables = enabled;
        self
    }

    /// Assign ownership of created tables and functions to `role`
    pub fn table_owner(mut self, role: impl Into<String>) -> Self {
        self.table_owner = Some(role.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> StoreConfig {
        StoreConfig {
            database_url: self.database_url,
            max_connections: self.max_connections,
            create_tables: self.create_tables,
            table_owner: self.table_owner,
        }
    }
}
