//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;
use url::Url;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where the `DatabaseService` lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("'{other}' is not one of postgres, memory")),
        }
    }
}

/// Outbound mail settings. Absent when `SMTP_HOST` is unset.
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub log_level: Level,
    /// Storefront origin; used for CORS and password reset links.
    pub client_url: String,
    pub smtp: Option<SmtpConfig>,
    pub qr_base_url: String,
    pub auth_session_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 5000)),
            storage_backend: StorageBackend::Memory,
            database_url: None,
            log_level: Level::INFO,
            client_url: "http://localhost:3000".to_string(),
            smtp: None,
            qr_base_url: "https://api.qrserver.com/v1/create-qr-code/".to_string(),
            auth_session_days: 30,
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Storage Settings ---
        let bind_address = parse_var("BIND_ADDRESS", &var_or("BIND_ADDRESS", "0.0.0.0:5000"))?;
        let storage_backend: StorageBackend =
            parse_var("STORAGE_BACKEND", &var_or("STORAGE_BACKEND", "postgres"))?;

        let database_url = std::env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingVar("DATABASE_URL".to_string()));
        }

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let client_url = var_or("CLIENT_URL", "http://localhost:3000");
        parse_var::<Url>("CLIENT_URL", &client_url)?;
        let qr_base_url = var_or("QR_BASE_URL", "https://api.qrserver.com/v1/create-qr-code/");
        parse_var::<Url>("QR_BASE_URL", &qr_base_url)?;
        let auth_session_days =
            parse_var("AUTH_SESSION_DAYS", &var_or("AUTH_SESSION_DAYS", "30"))?;

        // --- Load Mail Settings (optional as a group) ---
        let smtp = match std::env::var("SMTP_HOST") {
            Ok(host) => Some(SmtpConfig {
                host,
                port: parse_var("SMTP_PORT", &var_or("SMTP_PORT", "587"))?,
                username: var_or("SMTP_USERNAME", ""),
                password: var_or("SMTP_PASSWORD", ""),
                from_address: std::env::var("MAIL_FROM")
                    .map_err(|_| ConfigError::MissingVar("MAIL_FROM".to_string()))?,
            }),
            Err(_) => None,
        };

        Ok(Self {
            bind_address,
            storage_backend,
            database_url,
            log_level,
            client_url,
            smtp,
            qr_base_url,
            auth_session_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_parses_case_insensitively() {
        assert_eq!("Memory".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert_eq!("postgres".parse::<StorageBackend>(), Ok(StorageBackend::Postgres));
        assert!("mongo".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let config = Config::default();
        assert_eq!(config.bind_address.port(), 5000);
        assert_eq!(config.client_url, "http://localhost:3000");
        assert_eq!(config.auth_session_days, 30);
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = parse_var::<u16>("SMTP_PORT", "abc").unwrap_err();
        assert!(err.to_string().contains("SMTP_PORT"));
    }
}
