//! Service configuration read from the environment at startup.
//!
//! # Environment Variables
//!
//! - `AIRTABLE_API_KEY`: Access credential (required; startup fails without it)
//! - `APP_ENV`: `production`, `development` (default) or `test`
//! - `PORT`: HTTP port (default: 5000)
//! - `AIRTABLE_API_URL`: Remote API root (default: `https://api.airtable.com`)
//! - `AIRTABLE_TIMEOUT_SECS`: Upstream network timeout in seconds (default: 30)
//! - `AIRTABLE_BASES`: Base aliases as `Name=appId,Other=appId2` (default: none)

use std::fmt;
use std::time::Duration;

use api2_lib::{AirtableConfig, BaseDirectory, DEFAULT_API_URL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port used when `PORT` is unset or unparseable.
pub const DEFAULT_PORT: u16 = 5000;

/// Runtime mode selecting where caller credentials are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    Production,
    #[default]
    Development,
    Test,
}

impl RuntimeMode {
    /// Parse a runtime mode. Unrecognised values fall back to development.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => RuntimeMode::Production,
            "test" => RuntimeMode::Test,
            _ => RuntimeMode::Development,
        }
    }

    /// Development and test modes accept the credential as a query parameter.
    pub fn allows_query_credential(&self) -> bool {
        matches!(self, RuntimeMode::Development | RuntimeMode::Test)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeMode::Production => "production",
            RuntimeMode::Development => "development",
            RuntimeMode::Test => "test",
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal configuration problems detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0} from environmental variables")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
}

/// Top-level service configuration.
#[derive(Clone)]
pub struct ServiceConfig {
    pub api_key: String,
    pub mode: RuntimeMode,
    pub port: u16,
    pub airtable: AirtableConfig,
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// Tests use this to avoid mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("AIRTABLE_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingVar("AIRTABLE_API_KEY"))?;

        let mode = lookup("APP_ENV")
            .map(|v| RuntimeMode::from_str(&v))
            .unwrap_or_default();

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let api_url = lookup("AIRTABLE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout = match lookup("AIRTABLE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidVar {
                    name: "AIRTABLE_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => DEFAULT_TIMEOUT,
        };

        let bases = lookup("AIRTABLE_BASES")
            .map(|spec| BaseDirectory::parse(&spec))
            .unwrap_or_default();

        Ok(Self {
            api_key,
            mode,
            port,
            airtable: AirtableConfig {
                api_url,
                timeout,
                bases,
            },
        })
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_key", &"[redacted]")
            .field("mode", &self.mode)
            .field("port", &self.port)
            .field("api_url", &self.airtable.api_url)
            .field("timeout", &self.airtable.timeout)
            .field("base_aliases", &self.airtable.bases.len())
            .finish()
    }
}
