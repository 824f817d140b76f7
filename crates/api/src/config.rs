//! Process configuration, read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

use repairdesk_observability::{LogFormat, LogSettings};

pub const BIND_VAR: &str = "REPAIRDESK_BIND";
pub const DEMO_DATA_VAR: &str = "REPAIRDESK_DEMO_DATA";
pub const LOG_FORMAT_VAR: &str = "REPAIRDESK_LOG_FORMAT";

const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("REPAIRDESK_BIND={value:?} is not a socket address: {source}")]
    InvalidBind {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("{key}={value:?} is not a boolean (expected true/false/1/0)")]
    InvalidFlag { key: &'static str, value: String },

    #[error("REPAIRDESK_LOG_FORMAT={0:?} is not a log format (expected json/pretty)")]
    InvalidLogFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind: SocketAddr,
    /// Seed the sample parts and orders at startup.
    pub demo_data: bool,
    pub log: LogSettings,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            demo_data: false,
            log: LogSettings::default(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup(BIND_VAR).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidBind {
                value: bind_raw.clone(),
                source,
            })?;

        let demo_data = match lookup(DEMO_DATA_VAR) {
            None => false,
            Some(value) => parse_flag(DEMO_DATA_VAR, &value)?,
        };

        let mut log = LogSettings::default();
        if let Some(value) = lookup(LOG_FORMAT_VAR) {
            log.format = LogFormat::parse(&value).ok_or(ConfigError::InvalidLogFormat(value))?;
        }

        Ok(Self {
            bind,
            demo_data,
            log,
        })
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key,
            value: value.to_string(),
        }),
    }
}
