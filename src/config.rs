//! Refresh settings.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Default refresh interval: 30 seconds.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Environment variable overriding the refresh interval, in milliseconds.
pub const INTERVAL_ENV: &str = "REFRESH_KIT_INTERVAL_MS";

/// Configuration for a refreshable value.
///
/// Deserializes from the application's own config files:
///
/// ```
/// # use refresh_kit::RefreshConfig;
/// # use std::time::Duration;
/// let config: RefreshConfig = serde_json::from_str(r#"{"interval_ms": 5000}"#).unwrap();
/// assert_eq!(config.interval(), Duration::from_secs(5));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
        }
    }
}

impl RefreshConfig {
    /// Build a config with the given interval.
    ///
    /// The interval is stored in whole milliseconds: sub-millisecond parts are
    /// dropped and durations beyond `u64::MAX` ms saturate. Use
    /// [`RefreshableBuilder::with_interval`](crate::RefreshableBuilder::with_interval)
    /// for full `Duration` precision.
    pub fn with_interval(interval: Duration) -> Self {
        RefreshConfig {
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Load from the environment.
    ///
    /// Interval is determined by:
    /// 1. `REFRESH_KIT_INTERVAL_MS` environment variable (if set)
    /// 2. `DEFAULT_INTERVAL` constant (30s)
    ///
    /// # Errors
    /// Returns `Err` if the variable is set but not a positive integer.
    pub fn from_env() -> Result<Self> {
        match std::env::var(INTERVAL_ENV) {
            Ok(raw) => Self::parse_interval(&raw),
            Err(_) => Ok(Self::default()),
        }
    }

    fn parse_interval(raw: &str) -> Result<Self> {
        let interval_ms = raw.trim().parse::<u64>().map_err(|e| {
            Error::ConfigError(format!("{} must be milliseconds, got '{}': {}", INTERVAL_ENV, raw, e))
        })?;

        let config = RefreshConfig { interval_ms };
        config.validate()?;
        Ok(config)
    }

    /// Refresh interval as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Reject a zero interval.
    pub fn validate(&self) -> Result<()> {
        validate_interval(self.interval())
    }
}

pub(crate) fn validate_interval(interval: Duration) -> Result<()> {
    if interval.is_zero() {
        return Err(Error::ConfigError(
            "refresh interval must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
