use std::time::Duration;

/// Default delay between two status checks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(6);

/// Default number of checks per session (one minute at the default interval).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Longest accepted delay between two status checks.
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Polling cadence and budget, fixed for the lifetime of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Delay between consecutive checks.
    pub interval: Duration,
    /// Upper bound on checks issued per session.
    pub max_attempts: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PollerConfig {
    /// Build a validated configuration.
    pub fn new(interval: Duration, max_attempts: u32) -> Result<Self, ConfigError> {
        let config = Self {
            interval,
            max_attempts,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var             | Default |
    /// |---------------------|---------|
    /// | `POLL_INTERVAL_MS`  | `6000`  |
    /// | `POLL_MAX_ATTEMPTS` | `10`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let interval_ms = parse_var(
            "POLL_INTERVAL_MS",
            std::env::var("POLL_INTERVAL_MS").ok(),
            DEFAULT_INTERVAL.as_millis() as u64,
        )?;
        let max_attempts = parse_var(
            "POLL_MAX_ATTEMPTS",
            std::env::var("POLL_MAX_ATTEMPTS").ok(),
            DEFAULT_MAX_ATTEMPTS,
        )?;

        Self::new(Duration::from_millis(interval_ms), max_attempts)
    }

    /// Reject a zero or over-long interval and a zero attempt budget.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.interval > MAX_INTERVAL {
            return Err(ConfigError::IntervalTooLong {
                interval_ms: self.interval.as_millis(),
                max_ms: MAX_INTERVAL.as_millis(),
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        Ok(())
    }

    /// Total wall-clock budget implied by the interval and attempt count.
    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar { name, value }),
    }
}

/// Rejected poller configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Polling interval must be greater than zero")]
    ZeroInterval,

    #[error("Polling interval of {interval_ms}ms exceeds the {max_ms}ms maximum")]
    IntervalTooLong { interval_ms: u128, max_ms: u128 },

    #[error("max_attempts must be at least 1")]
    ZeroMaxAttempts,

    #[error("{name} has an invalid value: {value:?}")]
    InvalidVar { name: &'static str, value: String },
}
