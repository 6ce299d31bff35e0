//! Configuration loader for the `equipflow` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;
use std::net::SocketAddr;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Default number of entries returned by the upload history.
    pub history_limit: u32,

    /// Largest accepted upload request body, in bytes.
    pub max_upload_bytes: usize,

    /// Accepted `(username, password)` pairs for Basic auth.
    pub api_users: Vec<(String, String)>,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `BIND_ADDR` – listen address (default: `0.0.0.0:8080`)
/// - `HISTORY_LIMIT` – default history page size (default: 5)
/// - `MAX_UPLOAD_BYTES` – upload body limit (default: 10 MiB)
/// - `API_USERS` – `user:password` pairs, comma separated (default: none)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let history_limit = parse_env_u32!("HISTORY_LIMIT", 5);
    let max_upload_bytes = parse_env_u32!("MAX_UPLOAD_BYTES", 10 * 1024 * 1024) as usize;

    let bind_addr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse::<SocketAddr>()
        .map_err(|e| anyhow!("Invalid BIND_ADDR: {}", e))?;

    let api_users = parse_api_users(&env::var("API_USERS").unwrap_or_default())?;

    Ok(Config {
        db_url,
        db_pool_max,
        bind_addr,
        history_limit,
        max_upload_bytes,
        api_users,
    })
}

/// Parse `user:password[,user:password...]`. Blank input means no users.
fn parse_api_users(raw: &str) -> Result<Vec<(String, String)>> {
    // ---
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (user, password) = entry
                .split_once(':')
                .ok_or_else(|| anyhow!("Invalid API_USERS entry '{}': expected user:password", entry))?;
            if user.trim().is_empty() || password.is_empty() {
                return Err(anyhow!("Invalid API_USERS entry '{}': empty user or password", entry));
            }
            Ok((user.trim().to_string(), password.to_string()))
        })
        .collect()
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        // Mask the password in the database URL for security
        let masked_db_url = if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                format!(
                    "{}:****{}",
                    &self.db_url[..colon_pos],
                    &self.db_url[at_pos..]
                )
            } else {
                self.db_url.clone()
            }
        } else {
            self.db_url.clone()
        };

        let users: Vec<&str> = self.api_users.iter().map(|(u, _)| u.as_str()).collect();

        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL     : {}", masked_db_url);
        tracing::info!("  DB_POOL_MAX      : {}", self.db_pool_max);
        tracing::info!("  BIND_ADDR        : {}", self.bind_addr);
        tracing::info!("  HISTORY_LIMIT    : {}", self.history_limit);
        tracing::info!("  MAX_UPLOAD_BYTES : {}", self.max_upload_bytes);
        tracing::info!("  API_USERS        : {:?}", users);
        if users.is_empty() {
            tracing::warn!("No API_USERS configured; all authenticated routes will reject requests");
        }
    }
}
