//! Environment-backed configuration.
//!
//! All settings have working defaults so a bare `cargo run` starts a bot
//! with a local database and a gateway on localhost.

use anyhow::{Context, Result};
use chrono::FixedOffset;
use std::time::Duration;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file.
    pub database_path: String,
    /// Default log filter for `env_logger`.
    pub log_level: String,
    /// Address the gateway listens on.
    pub gateway_addr: String,
    /// How often the scheduler polls for due reminders.
    pub poll_interval: Duration,
    /// The single fixed UTC offset all time arithmetic uses.
    pub offset: FixedOffset,
}

impl Config {
    /// Load configuration from environment variables, applying defaults
    /// for anything unset.
    pub fn from_env() -> Result<Self> {
        let database_path = env_or("DATABASE_PATH", "reminders.db");
        let log_level = env_or("LOG_LEVEL", "info");
        let gateway_addr = env_or("GATEWAY_ADDR", "127.0.0.1:7600");

        let poll_interval_secs: u64 = env_or("POLL_INTERVAL_SECS", "10")
            .parse()
            .context("POLL_INTERVAL_SECS must be a whole number of seconds")?;

        let offset_minutes: i32 = env_or("UTC_OFFSET_MINUTES", "0")
            .parse()
            .context("UTC_OFFSET_MINUTES must be a whole number of minutes")?;
        let offset = FixedOffset::east_opt(offset_minutes * 60)
            .context("UTC_OFFSET_MINUTES is out of range (must be within a day)")?;

        Ok(Config {
            database_path,
            log_level,
            gateway_addr,
            poll_interval: Duration::from_secs(poll_interval_secs),
            offset,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
