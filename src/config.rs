use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use rusoto_signature::Region;

use crate::services::aws_service::WaiterConfig;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// `None` leaves region resolution to rusoto.
    pub region: Option<Region>,
    pub waiter: WaiterConfig,
}

impl Config {
    /// Reads settings from the process environment, after `.env` has been loaded.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_address =
            lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let region = match lookup("AWS_REGION") {
            Some(name) => Some(
                Region::from_str(&name).with_context(|| format!("Invalid AWS_REGION: {}", name))?,
            ),
            None => None,
        };

        let mut waiter = WaiterConfig::default();
        if let Some(value) = lookup("WAITER_DELAY_SECS") {
            let secs: u64 = value
                .parse()
                .with_context(|| format!("Invalid WAITER_DELAY_SECS: {}", value))?;
            waiter.delay = Duration::from_secs(secs);
        }
        if let Some(value) = lookup("WAITER_MAX_ATTEMPTS") {
            waiter.max_attempts = value
                .parse()
                .with_context(|| format!("Invalid WAITER_MAX_ATTEMPTS: {}", value))?;
            anyhow::ensure!(
                waiter.max_attempts > 0,
                "Invalid WAITER_MAX_ATTEMPTS: {} (must be at least 1)",
                value
            );
        }

        Ok(Config {
            bind_address,
            region,
            waiter,
        })
    }
}
