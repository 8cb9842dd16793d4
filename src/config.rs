use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::{DEFAULT_CACHE_TTL_SECS, DEFAULT_DATE_FORMAT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Forum connection and rendering settings loaded from environment variables.
///
/// The forum URL and credentials are optional here. A missing value only
/// becomes an error when a request actually has to be made, so fragments
/// that can be served from cache keep rendering.
#[derive(Debug, Clone)]
pub struct Config {
    // Forum
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_username: Option<String>,

    // Rendering
    pub date_format: String,
    pub utc_offset_minutes: i32,
    pub live_refresh: bool,
    pub diagnostic_mode: bool,

    // Caching
    pub cache_ttl: Duration,
    pub group_snapshot_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            api_username: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            utc_offset_minutes: 0,
            live_refresh: false,
            diagnostic_mode: false,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            group_snapshot_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Forum
            base_url: optional_env("DISCOURSE_URL").map(|url| url.trim_end_matches('/').to_string()),
            api_key: optional_env("DISCOURSE_API_KEY"),
            api_username: optional_env("DISCOURSE_API_USERNAME"),

            // Rendering
            date_format: env_or_default("DATE_FORMAT", DEFAULT_DATE_FORMAT),
            utc_offset_minutes: parse_env_i32("UTC_OFFSET_MINUTES", 0)?,
            live_refresh: parse_env_bool("LIVE_REFRESH", false)?,
            diagnostic_mode: parse_env_bool("DIAGNOSTIC_MODE", false)?,

            // Caching
            cache_ttl: Duration::from_secs(parse_env_u64("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?),
            group_snapshot_path: optional_env("GROUP_SNAPSHOT_PATH").map(PathBuf::from),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "CACHE_TTL_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        // chrono's FixedOffset accepts strictly less than a day either way
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::InvalidValue {
                name: "UTC_OFFSET_MINUTES".to_string(),
                message: format!("must be within +/-1439, got {}", self.utc_offset_minutes),
            });
        }
        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    name: "DISCOURSE_URL".to_string(),
                    message: format!("must be an http(s) URL, got '{url}'"),
                });
            }
        }
        Ok(())
    }

    /// Configuration pointing at a forum with credentials, for tests.
    #[must_use]
    pub fn for_forum(base_url: &str) -> Self {
        Self {
            base_url: Some(base_url.trim_end_matches('/').to_string()),
            api_key: Some("test-key".to_string()),
            api_username: Some("system".to_string()),
            ..Self::default()
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_i32(name: &str, default: i32) -> Result<i32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => parse_bool(&val).ok_or(ConfigError::ParseBool {
            name: name.to_string(),
            value: val,
        }),
        _ => Ok(default),
    }
}

/// Parse the boolean spellings accepted in env vars and placeholder attributes.
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
