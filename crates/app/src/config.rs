//! Application configuration.
//!
//! Everything has a default; environment variables or a JSON file override it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use splitbook_infra::DatabaseConfig;
use splitbook_ledger::Currency;
use splitbook_observability::{LogConfig, LogFormat};

pub const ENV_DATABASE_URL: &str = "SPLITBOOK_DATABASE_URL";
pub const ENV_DATABASE_MAX_CONNECTIONS: &str = "SPLITBOOK_DATABASE_MAX_CONNECTIONS";
pub const ENV_LOG_FILTER: &str = "SPLITBOOK_LOG_FILTER";
pub const ENV_LOG_FORMAT: &str = "SPLITBOOK_LOG_FORMAT";
pub const ENV_DEFAULT_CURRENCY: &str = "SPLITBOOK_DEFAULT_CURRENCY";
pub const ENV_SHOW_ONBOARDING: &str = "SPLITBOOK_SHOW_ONBOARDING";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub log: LogConfig,
    /// Currency preselected when the caller does not pick one.
    pub default_currency: Currency,
    /// Whether the onboarding carousel should be shown on start.
    pub show_onboarding: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            log: LogConfig::default(),
            default_currency: Currency::Usd,
            show_onboarding: true,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `SPLITBOOK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each known key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_DATABASE_URL) {
            config.database.url = url;
        }
        if let Some(raw) = lookup(ENV_DATABASE_MAX_CONNECTIONS) {
            config.database.max_connections = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid(ENV_DATABASE_MAX_CONNECTIONS, &raw, "expected a positive integer"))?;
        }
        if let Some(filter) = lookup(ENV_LOG_FILTER) {
            config.log.filter = filter;
        }
        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            config.log.format = raw
                .parse::<LogFormat>()
                .map_err(|reason| invalid(ENV_LOG_FORMAT, &raw, reason))?;
        }
        if let Some(raw) = lookup(ENV_DEFAULT_CURRENCY) {
            config.default_currency = raw
                .parse::<Currency>()
                .map_err(|e| invalid(ENV_DEFAULT_CURRENCY, &raw, e.to_string()))?;
        }
        if let Some(raw) = lookup(ENV_SHOW_ONBOARDING) {
            config.show_onboarding = parse_flag(&raw)
                .ok_or_else(|| invalid(ENV_SHOW_ONBOARDING, &raw, "expected true/false"))?;
        }

        Ok(config)
    }

    /// Load from a JSON document; missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
