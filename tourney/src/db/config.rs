//! Database configuration module.
//!
//! Provides configuration structures for database connection management.

use crate::config::ConfigError;

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string (required)
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 20)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 5)
    /// - `DB_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 10)
    /// - `DB_IDLE_TIMEOUT`: Idle timeout in seconds (default: 600)
    /// - `DB_MAX_LIFETIME`: Max lifetime in seconds (default: 1800)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` if `DATABASE_URL` is not set and
    /// `ConfigError::Invalid` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`DatabaseConfig::from_env`] with an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingRequired {
            var: "DATABASE_URL".to_string(),
        })?;
        let defaults = Self::development();

        let config = Self {
            database_url,
            max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: parse(&lookup, "DB_MIN_CONNECTIONS", defaults.min_connections)?,
            connection_timeout_secs: parse(
                &lookup,
                "DB_CONNECTION_TIMEOUT",
                defaults.connection_timeout_secs,
            )?,
            idle_timeout_secs: parse(&lookup, "DB_IDLE_TIMEOUT", defaults.idle_timeout_secs)?,
            max_lifetime_secs: parse(&lookup, "DB_MAX_LIFETIME", defaults.max_lifetime_secs)?,
        };

        if config.min_connections > config.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "{} exceeds DB_MAX_CONNECTIONS ({})",
                    config.min_connections, config.max_connections
                ),
            });
        }

        Ok(config)
    }

    /// Create a default configuration for development
    ///
    /// Uses `postgres://postgres@localhost/tourney_db` as the database URL
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/tourney_db".to_string(),
            max_connections: 20,
            min_connections: 5,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

fn parse<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: var.to_string(),
            reason: format!("{raw:?} is not a valid number"),
        }),
        None => Ok(default),
    }
}
