use std::{env, str::FromStr, time::Duration};

use tracing::Level;

use crate::domain::{Error, Points};

pub const DEFAULT_MAX_BALANCE: Points = Points(100_000);

/// Process-wide settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct PointConfig {
    pub max_balance: Points,
    pub lock_timeout: Option<Duration>,
    pub store_latency: Option<Duration>,
    pub log_level: Level,
}

impl Default for PointConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BALANCE)
    }
}

impl PointConfig {
    /// # Panics
    ///
    /// Panics if `max_balance` is negative; `from_env` reports the same
    /// condition as [`Error::Config`].
    pub fn new(max_balance: Points) -> Self {
        assert!(
            max_balance >= Points::ZERO,
            "negative max balance {}",
            max_balance
        );
        Self {
            max_balance,
            lock_timeout: None,
            store_latency: None,
            log_level: Level::WARN,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    pub fn with_store_latency(mut self, latency: Duration) -> Self {
        self.store_latency = Some(latency);
        self
    }

    /// Reads `POINT_MAX_BALANCE`, `POINT_LOCK_TIMEOUT_MS`,
    /// `POINT_STORE_LATENCY_MS` and `POINT_LOG`.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("POINT_MAX_BALANCE") {
            let max_balance = Points::from_integer_str(&raw).ok_or_else(|| {
                Error::Config(format!("POINT_MAX_BALANCE is not an integer: {}", raw))
            })?;
            if max_balance < Points::ZERO {
                return Err(Error::Config(format!(
                    "POINT_MAX_BALANCE must not be negative: {}",
                    max_balance
                )));
            }
            config.max_balance = max_balance;
        }

        if let Some(raw) = lookup("POINT_LOCK_TIMEOUT_MS") {
            config.lock_timeout = Some(parse_millis("POINT_LOCK_TIMEOUT_MS", &raw)?);
        }

        if let Some(raw) = lookup("POINT_STORE_LATENCY_MS") {
            let latency = parse_millis("POINT_STORE_LATENCY_MS", &raw)?;
            config.store_latency = (!latency.is_zero()).then_some(latency);
        }

        if let Some(raw) = lookup("POINT_LOG") {
            config.log_level = Level::from_str(raw.trim())
                .map_err(|_| Error::Config(format!("POINT_LOG is not a log level: {}", raw)))?;
        }

        Ok(config)
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration, Error> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| Error::Config(format!("{} is not a millisecond count: {}", key, raw)))
}
