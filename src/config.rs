// src/config.rs
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::ledger::RetryPolicy;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_connections: u32,
    pub ledger: LedgerSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSettings {
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    pub lock_timeout_ms: u64,
}

impl LedgerSettings {
    pub fn bulk_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_backoff_ms))
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let retry_attempts = parse_or(&lookup, "LEDGER_RETRY_ATTEMPTS", 3u32)?;
        if retry_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "LEDGER_RETRY_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_url,
            host: parse_or(&lookup, "HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_or(&lookup, "PORT", 3000u16)?,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10u32)?,
            ledger: LedgerSettings {
                retry_attempts,
                retry_backoff_ms: parse_or(&lookup, "LEDGER_RETRY_BACKOFF_MS", 50u64)?,
                lock_timeout_ms: parse_or(&lookup, "LEDGER_LOCK_TIMEOUT_MS", 5000u64)?,
            },
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
