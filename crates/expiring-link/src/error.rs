//! Error types for link token operations.

use thiserror::Error;

/// Reasons a token failed verification.
///
/// Success is `Ok(())`. The variants deliberately do not say whether a
/// mismatch came from a wrong secret or a tampered signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckError {
    /// Token is structurally broken: wrong field count, non-hex age or
    /// rounds, or a round count above the configured ceiling.
    #[error("Corrupt Hash")]
    CorruptHash,

    /// Token expiry instant is in the past.
    #[error("Hash expired")]
    HashExpired,

    /// Recomputed token does not match the supplied one.
    #[error("Hash did not validate")]
    InvalidHash,
}

/// Errors raised while loading or validating a [`LinkConfig`](crate::LinkConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result of [`ExpiringLink::check`](crate::ExpiringLink::check).
pub type CheckResult = std::result::Result<(), CheckError>;

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
