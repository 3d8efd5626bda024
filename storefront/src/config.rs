//! Storefront configuration.
//!
//! Defaults suit the demo; every value can be overridden from the
//! environment:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `SCIPUB_SETTLEMENT_TIMEOUT_MS` | `settlement_timeout` | 30 s |
//! | `SCIPUB_SETTLEMENT_LATENCY_MS` | `settlement_latency` | 1500 ms |
//! | `SCIPUB_INSIGHTS_TIMEOUT_MS` | `insights_timeout` | 30 s |
//! | `SCIPUB_INSIGHTS_MODEL` | `insights_model` | `claude-sonnet-4-5-20250929` |
//! | `SCIPUB_INSIGHTS_MAX_TOKENS` | `insights_max_tokens` | 1024 |
//! | `SCIPUB_LOG` | `log_filter` | `scipub_storefront=info,scipub_runtime=warn` |
//!
//! # Example
//!
//! ```no_run
//! use scipub_storefront::StorefrontConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorefrontConfig::from_env()?;
//! println!("Settlement timeout: {:?}", config.settlement_timeout);
//! # Ok(())
//! # }
//! ```

use scipub_insights::messages::DEFAULT_MODEL;
use std::time::Duration;
use thiserror::Error;

/// Configuration error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        /// Environment variable name
        key: &'static str,
        /// Raw value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Configuration validation failed
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Storefront configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Upper bound on one settlement round-trip.
    ///
    /// Default: 30 seconds
    pub settlement_timeout: Duration,

    /// Latency of the simulated payment gateway.
    ///
    /// Default: 1500 ms
    pub settlement_latency: Duration,

    /// Upper bound on one insights request.
    ///
    /// Default: 30 seconds
    pub insights_timeout: Duration,

    /// Claude model used for insights
    pub insights_model: String,

    /// Token budget for one insights answer.
    ///
    /// Default: 1024
    pub insights_max_tokens: u32,

    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            settlement_timeout: Duration::from_secs(30),
            settlement_latency: Duration::from_millis(1500),
            insights_timeout: Duration::from_secs(30),
            insights_model: DEFAULT_MODEL.to_string(),
            insights_max_tokens: 1024,
            log_filter: "scipub_storefront=info,scipub_runtime=warn".to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from process environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is malformed or the result is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns error if a variable is malformed or the result is invalid
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64, _>(&lookup, "SCIPUB_SETTLEMENT_TIMEOUT_MS")? {
            config.settlement_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "SCIPUB_SETTLEMENT_LATENCY_MS")? {
            config.settlement_latency = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "SCIPUB_INSIGHTS_TIMEOUT_MS")? {
            config.insights_timeout = Duration::from_millis(ms);
        }
        if let Some(tokens) = parse_var::<u32, _>(&lookup, "SCIPUB_INSIGHTS_MAX_TOKENS")? {
            config.insights_max_tokens = tokens;
        }
        if let Some(model) = lookup("SCIPUB_INSIGHTS_MODEL") {
            config.insights_model = model.trim().to_string();
        }
        if let Some(filter) = lookup("SCIPUB_LOG") {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if a timeout or token budget is zero or the model is blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settlement_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "settlement_timeout must be positive".to_string(),
            ));
        }
        if self.insights_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "insights_timeout must be positive".to_string(),
            ));
        }
        if self.insights_max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "insights_max_tokens must be positive".to_string(),
            ));
        }
        if self.insights_model.is_empty() {
            return Err(ConfigError::ValidationError(
                "insights_model must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Set settlement timeout.
    #[must_use]
    pub const fn with_settlement_timeout(mut self, timeout: Duration) -> Self {
        self.settlement_timeout = timeout;
        self
    }

    /// Set simulated settlement latency.
    #[must_use]
    pub const fn with_settlement_latency(mut self, latency: Duration) -> Self {
        self.settlement_latency = latency;
        self
    }

    /// Set insights timeout.
    #[must_use]
    pub const fn with_insights_timeout(mut self, timeout: Duration) -> Self {
        self.insights_timeout = timeout;
        self
    }

    /// Set insights model.
    #[must_use]
    pub fn with_insights_model(mut self, model: impl Into<String>) -> Self {
        self.insights_model = model.into();
        self
    }

    /// Set insights token budget.
    #[must_use]
    pub const fn with_insights_max_tokens(mut self, tokens: u32) -> Self {
        self.insights_max_tokens = tokens;
        self
    }

    /// Set the default log filter.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidValue {
                    key,
                    reason: e.to_string(),
                    value,
                })
        })
        .transpose()
}
