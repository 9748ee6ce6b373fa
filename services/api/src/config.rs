//! services/api/src/config.rs
//!
//! Defines the service's configuration structures and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use scrollnet_core::session::SessionSettings;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration of the `api` server, loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    pub max_page_limit: usize,
    pub session: SessionSettings,
}

/// Configuration of the `swipe` terminal client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub backend_url: String,
    pub log_level: Level,
    pub user_id: Option<String>,
    pub token: Option<String>,
    pub session: SessionSettings,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        // --- Load Server and Database Settings ---
        let bind_address = parse_or("BIND_ADDRESS", "0.0.0.0:3000")?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let max_page_limit: usize = parse_or("MAX_PAGE_LIMIT", "50")?;
        if max_page_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_PAGE_LIMIT".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level: log_level()?,
            cors_origin,
            max_page_limit,
            session: session_settings()?,
        })
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        let backend_url = std::env::var("BACKEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            backend_url,
            log_level: log_level()?,
            user_id: std::env::var("SCROLLNET_USER_ID").ok().filter(|s| !s.is_empty()),
            token: std::env::var("SCROLLNET_TOKEN").ok(),
            session: session_settings()?,
        })
    }
}

fn load_dotenv() {
    // Only load from .env in non-test mode to avoid contamination.
    if !cfg!(test) {
        dotenvy::dotenv().ok();
    }
}

fn log_level() -> Result<Level, ConfigError> {
    let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
    log_level_str.parse::<Level>().map_err(|_| {
        ConfigError::InvalidValue(
            "RUST_LOG".to_string(),
            format!("'{}' is not a valid log level", log_level_str),
        )
    })
}

/// Pipeline settings shared by the server-hosted and client-side sessions.
fn session_settings() -> Result<SessionSettings, ConfigError> {
    let cadence: NonZeroU32 = parse_or("FEEDBACK_CADENCE", "5")?;
    let page_size: usize = parse_or("FEED_PAGE_SIZE", "10")?;
    let swipe_threshold: f64 = parse_or("SWIPE_THRESHOLD_PX", "50")?;
    if !swipe_threshold.is_finite() || swipe_threshold < 0.0 {
        return Err(ConfigError::InvalidValue(
            "SWIPE_THRESHOLD_PX".to_string(),
            format!("'{}' is not a usable distance", swipe_threshold),
        ));
    }
    Ok(SessionSettings {
        swipe_threshold,
        cadence,
        page_size: page_size.max(1),
    })
}

fn parse_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}
