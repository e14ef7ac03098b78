//! Database configuration, parsed from TOML.
//!
//! ```toml
//! required = ["name", "category"]
//!
//! [retry]
//! max_attempts = 5
//! backoff_ms = 2
//!
//! [constraints]
//! stock = 0
//! ```

use crate::error::{Error, Result};
use occstore_concurrency::{Constraints, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Retry bound for delta updates.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Inclusive minimum per integer field.
    #[serde(default)]
    pub constraints: BTreeMap<String, i64>,

    /// Fields every record must carry.
    #[serde(default)]
    pub required: Vec<String>,
}

/// `[retry]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum conditional writes per delta update, first included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts, in milliseconds.
    #[serde(default)]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    RetryPolicy::DEFAULT_MAX_ATTEMPTS
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: 0,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the controller cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if let Some(blank) = self.required.iter().find(|f| f.trim().is_empty()) {
            return Err(Error::Config(format!("required field name {:?} is blank", blank)));
        }
        Ok(())
    }

    /// Retry policy described by `[retry]`.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.max_attempts)
            .with_backoff(Duration::from_millis(self.retry.backoff_ms))
    }

    /// Constraints described by `constraints` and `required`.
    pub fn constraints(&self) -> Constraints {
        let with_minimums = self
            .constraints
            .iter()
            .fold(Constraints::new(), |c, (field, &min)| c.min(field.as_str(), min));
        self.required
            .iter()
            .fold(with_minimums, |c, field| c.require(field.as_str()))
    }
}
