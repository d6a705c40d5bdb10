//! Stateless, time-limited link tokens.
//!
//! This crate provides functionality for:
//! - Generating tokens that embed their own expiry instant and cost factor
//! - Verifying tokens against a per-identity secret, with no server-side state
//! - Tuning the hashing cost ("rounds") and capping it at verification time
//!
//! # Token Format
//!
//! Tokens are `{age}g{rounds}g{signature}` (or `{age}g{signature}` for the
//! plain format), with every field in lowercase hex. `age` is the number of
//! seconds from the configured epoch to the token's expiry instant.
//!
//! Example: `5ac2f1g8g9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08`
//!
//! # Security Notes
//!
//! - The epoch must never change once tokens have been issued; moving it
//!   forward revives expired tokens.
//! - Secrets should be unique per identity and rotated when a token is used,
//!   since tokens cannot be revoked any other way.
//! - Round counts above `max_rounds` are rejected before any hashing.
//! - Token comparison is constant-time.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use expiring_link::{ExpiringLink, LinkConfig};
//!
//! let epoch = "2021-09-29T12:45:26.371Z".parse().unwrap();
//! let link = ExpiringLink::new(
//!     LinkConfig::new(epoch)
//!         .with_expire(Duration::from_secs(24 * 60 * 60))
//!         .with_rounds(8)
//!         .with_max_rounds(16),
//! );
//!
//! // Stored alongside the account and rotated whenever the password changes.
//! let account_secret = "7419523061893";
//!
//! let token = link.generate(account_secret);
//! assert!(link.check(&token, account_secret).is_ok());
//! ```

mod clock;
mod codec;
mod config;
mod error;
mod format;
mod sign;

// Public re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{ExpiringLink, Settings};
pub use config::{DEFAULT_EXPIRE, DEFAULT_ROUNDS, LinkConfig};
pub use error::{CheckError, CheckResult, ConfigError, Result};
pub use format::{DELIMITER, ParsedToken, TokenFormat, format_message, format_token, parse};
pub use sign::{sign_keyed, sign_rounds};
