//! services/dashboard/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// Project URL of the hosted backend, without a trailing slash.
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub profile_table: String,
    /// When set, profiles are read and written directly in Postgres instead of
    /// through the REST gateway.
    pub database_url: Option<String>,
    pub cors_origin: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_source<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Hosted Backend ---
        let supabase_url = var("SUPABASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("SUPABASE_URL".to_string()))?;
        if !(supabase_url.starts_with("http://") || supabase_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "SUPABASE_URL".to_string(),
                format!("'{}' is not an http(s) URL", supabase_url),
            ));
        }
        let supabase_url = supabase_url.trim_end_matches('/').to_string();

        let supabase_anon_key = var("SUPABASE_ANON_KEY")
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("SUPABASE_ANON_KEY".to_string()))?;

        let profile_table = var("PROFILE_TABLE").unwrap_or_else(|| "users".to_string());
        if !is_identifier(&profile_table) {
            return Err(ConfigError::InvalidValue(
                "PROFILE_TABLE".to_string(),
                format!("'{}' is not a plain table name", profile_table),
            ));
        }

        // --- Optional Settings ---
        let database_url = var("DATABASE_URL").filter(|v| !v.is_empty());
        let cors_origin = var("CORS_ORIGIN").filter(|v| !v.is_empty());

        Ok(Self {
            bind_address,
            log_level,
            supabase_url,
            supabase_anon_key,
            profile_table,
            database_url,
            cors_origin,
        })
    }
}

/// Letters, digits and underscores, not starting with a digit. The name is
/// interpolated into SQL and REST paths.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
