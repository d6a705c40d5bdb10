//! Configuration for link token generation and validation.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::format::TokenFormat;

/// Default validity window for new tokens.
pub const DEFAULT_EXPIRE: Duration = Duration::from_secs(24 * 60 * 60);

/// Default cost factor for new tokens.
pub const DEFAULT_ROUNDS: u64 = 8;

/// Configuration for an [`ExpiringLink`](crate::ExpiringLink).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Reference instant all token ages are measured from.
    ///
    /// Pick any date in the past and never change it afterwards: moving it
    /// forward makes previously expired tokens valid again. Dates closer
    /// to the present give shorter tokens.
    pub epoch: DateTime<Utc>,
    /// How long a newly generated token stays valid. Changing it only
    /// affects tokens generated after the change.
    pub expire: Duration,
    /// Hash chain length used for newly generated tokens.
    pub rounds: u64,
    /// Largest round count a token may claim during verification (0 = unlimited).
    pub max_rounds: u64,
    /// Two-field or three-field token layout.
    pub format: TokenFormat,
}

impl LinkConfig {
    /// Create a new config with the given epoch and default settings.
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self {
            epoch,
            expire: DEFAULT_EXPIRE,
            rounds: DEFAULT_ROUNDS,
            max_rounds: 0,
            format: TokenFormat::Rounds,
        }
    }

    /// Set the validity window.
    pub fn with_expire(mut self, expire: Duration) -> Self {
        self.expire = expire;
        self
    }

    /// Set the default round count.
    pub fn with_rounds(mut self, rounds: u64) -> Self {
        self.rounds = rounds;
        self
    }

    /// Set the verification ceiling on round counts.
    pub fn with_max_rounds(mut self, max_rounds: u64) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Set the token layout.
    pub fn with_format(mut self, format: TokenFormat) -> Self {
        self.format = format;
        self
    }

    /// Parse a YAML config document.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let file: FileConfig = serde_yaml::from_str(s)?;
        let config = LinkConfig::from(file);
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Reject settings that would make the codec unusable.
    pub fn validate(&self) -> Result<()> {
        if self.expire.is_zero() {
            return Err(ConfigError::Invalid(
                "expire must be greater than zero".to_string(),
            ));
        }
        let expires_in_range = TimeDelta::from_std(self.expire)
            .ok()
            .and_then(|expire| self.epoch.checked_add_signed(expire))
            .is_some();
        if !expires_in_range {
            return Err(ConfigError::Invalid(format!(
                "expire ({}s) runs past the latest representable instant",
                self.expire.as_secs()
            )));
        }
        if self.format == TokenFormat::Rounds && self.max_rounds > 0 && self.rounds > self.max_rounds
        {
            return Err(ConfigError::Invalid(format!(
                "rounds ({}) exceeds max_rounds ({}); generated tokens would never verify",
                self.rounds, self.max_rounds
            )));
        }
        Ok(())
    }
}

/// On-disk representation of [`LinkConfig`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    epoch: DateTime<Utc>,
    #[serde(default = "default_expire_secs")]
    expire_secs: u64,
    #[serde(default = "default_rounds")]
    rounds: u64,
    #[serde(default)]
    max_rounds: u64,
    #[serde(default)]
    format: TokenFormat,
}

fn default_expire_secs() -> u64 {
    DEFAULT_EXPIRE.as_secs()
}

fn default_rounds() -> u64 {
    DEFAULT_ROUNDS
}

impl From<FileConfig> for LinkConfig {
    fn from(file: FileConfig) -> Self {
        Self {
            epoch: file.epoch,
            expire: Duration::from_secs(file.expire_secs),
            rounds: file.rounds,
            max_rounds: file.max_rounds,
            format: file.format,
        }
    }
}
