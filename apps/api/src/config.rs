use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Uploads above this size are rejected before parsing (10 MB by default).
    pub max_upload_bytes: usize,
    pub parse_timeout: Duration,
    pub rate_limit_max_uploads: u32,
    pub rate_limit_window: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            parse_timeout: Duration::from_secs(30),
            rate_limit_max_uploads: 20,
            rate_limit_window: Duration::from_secs(60),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            port: env_or("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            parse_timeout: Duration::from_secs(env_or(
                "PARSE_TIMEOUT_SECS",
                defaults.parse_timeout.as_secs(),
            )?),
            rate_limit_max_uploads: env_or(
                "RATE_LIMIT_MAX_UPLOADS",
                defaults.rate_limit_max_uploads,
            )?,
            rate_limit_window: Duration::from_secs(env_or(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window.as_secs(),
            )?),
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
