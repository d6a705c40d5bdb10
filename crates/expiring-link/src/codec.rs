//! Token generation and verification.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use subtle::ConstantTimeEq;

use crate::clock::{Clock, SystemClock};
use crate::config::LinkConfig;
use crate::error::{CheckError, CheckResult};
use crate::format::{self, TokenFormat, format_message, format_token};
use crate::sign::{sign_keyed, sign_rounds};

/// Settings that may change while the codec is in use.
///
/// The codec holds these as an immutable snapshot; every `generate` or
/// `check` call reads a single snapshot, and updates swap in a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Validity window for newly generated tokens.
    pub expire: Duration,
    /// Round count for newly generated tokens.
    pub rounds: u64,
    /// Largest round count accepted during verification (0 = unlimited).
    pub max_rounds: u64,
}

/// Generates and verifies self-contained expiring tokens.
///
/// Nothing is stored server side: the expiry instant and round count travel
/// inside the token, and the signature binds them to the caller's secret.
pub struct ExpiringLink<C: Clock = SystemClock> {
    epoch: DateTime<Utc>,
    format: TokenFormat,
    settings: RwLock<Arc<Settings>>,
    clock: C,
}

impl ExpiringLink<SystemClock> {
    /// Create a codec that reads the system clock.
    pub fn new(config: LinkConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> ExpiringLink<C> {
    /// Create a codec with a custom time source.
    pub fn with_clock(config: LinkConfig, clock: C) -> Self {
        let settings = Settings {
            expire: config.expire,
            rounds: config.rounds,
            max_rounds: config.max_rounds,
        };
        Self {
            epoch: config.epoch,
            format: config.format,
            settings: RwLock::new(Arc::new(settings)),
            clock,
        }
    }

    /// The reference instant. Fixed for the lifetime of the codec.
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn format(&self) -> TokenFormat {
        self.format
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> Arc<Settings> {
        // Writers only store a fully built snapshot, so a poisoned lock still
        // holds a consistent value.
        Arc::clone(&self.settings.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the settings snapshot with a modified copy.
    ///
    /// Calls already in flight keep the snapshot they started with. If `f`
    /// panics the current snapshot stays in place.
    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        let mut guard = self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = Settings::clone(&guard);
        f(&mut next);

        if self.format == TokenFormat::Rounds && next.max_rounds > 0 && next.rounds > next.max_rounds
        {
            log::warn!(
                "rounds ({}) exceeds max_rounds ({}); new tokens will not verify",
                next.rounds,
                next.max_rounds
            );
        }
        log::info!(
            "link settings updated: expire={}s rounds={} max_rounds={}",
            next.expire.as_secs(),
            next.rounds,
            next.max_rounds
        );
        *guard = Arc::new(next);
    }

    /// Change the validity window for tokens generated from now on.
    pub fn set_expire(&self, expire: Duration) {
        self.update(|s| s.expire = expire);
    }

    /// Change the round count for tokens generated from now on.
    pub fn set_rounds(&self, rounds: u64) {
        self.update(|s| s.rounds = rounds);
    }

    /// Change the verification ceiling. Lowering it rejects already issued
    /// tokens whose round count is above the new value.
    pub fn set_max_rounds(&self, max_rounds: u64) {
        self.update(|s| s.max_rounds = max_rounds);
    }

    /// Generate a token for `secret`.
    ///
    /// The secret should be non-empty and unique per identity; an empty secret
    /// makes every token for that identity forgeable by anyone who knows the
    /// epoch. If the clock reads before the epoch the token is issued already
    /// expired.
    pub fn generate(&self, secret: impl AsRef<[u8]>) -> String {
        let secret = secret.as_ref();
        if secret.is_empty() {
            log::warn!("generating link token with an empty secret");
        }

        let settings = self.settings();
        let now = self.clock.now();
        let expire = TimeDelta::from_std(settings.expire).unwrap_or(TimeDelta::MAX);
        let window = (now - self.epoch)
            .checked_add(&expire)
            .unwrap_or(TimeDelta::MAX);
        let age = match u64::try_from(window.num_seconds()) {
            Ok(age) if age > self.max_age() => {
                log::warn!(
                    "expiry window runs past the latest representable instant; clamping"
                );
                self.max_age()
            }
            Ok(age) => age,
            Err(_) => {
                log::warn!(
                    "clock ({now}) is before epoch ({}); issuing an expired token",
                    self.epoch
                );
                0
            }
        };

        let rounds = match self.format {
            TokenFormat::Plain => None,
            TokenFormat::Rounds => Some(settings.rounds),
        };
        self.token_for(age, rounds, secret)
    }

    /// Verify `token` against `secret`.
    ///
    /// Structure, round ceiling and expiry are checked before any hashing, so
    /// malformed, inflated or expired tokens are rejected cheaply.
    pub fn check(&self, token: &str, secret: impl AsRef<[u8]>) -> CheckResult {
        let result = self.verify(token, secret.as_ref());
        if let Err(err) = &result {
            log::debug!("link token rejected: {err}");
        }
        result
    }

    /// Expiry instant embedded in `token`, without checking its signature.
    pub fn expires_at(&self, token: &str) -> Result<DateTime<Utc>, CheckError> {
        let parsed = format::parse(token, self.format)?;
        self.expiry_instant(parsed.age)
    }

    fn verify(&self, token: &str, secret: &[u8]) -> CheckResult {
        let settings = self.settings();
        let parsed = format::parse(token, self.format)?;

        if let Some(rounds) = parsed.rounds {
            if settings.max_rounds > 0 && rounds > settings.max_rounds {
                return Err(CheckError::CorruptHash);
            }
        }

        if self.expiry_instant(parsed.age)? < self.clock.now() {
            return Err(CheckError::HashExpired);
        }

        let expected = self.token_for(parsed.age, parsed.rounds, secret);
        if tokens_equal(&expected, token) {
            Ok(())
        } else {
            Err(CheckError::InvalidHash)
        }
    }

    /// Largest age whose expiry instant is still representable.
    fn max_age(&self) -> u64 {
        u64::try_from((DateTime::<Utc>::MAX_UTC - self.epoch).num_seconds()).unwrap_or(0)
    }

    fn expiry_instant(&self, age: u64) -> Result<DateTime<Utc>, CheckError> {
        i64::try_from(age)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| self.epoch.checked_add_signed(delta))
            .ok_or(CheckError::CorruptHash)
    }

    fn token_for(&self, age: u64, rounds: Option<u64>, secret: &[u8]) -> String {
        let message = format_message(age, rounds);
        let signature = match rounds {
            Some(rounds) => sign_rounds(&message, secret, rounds),
            None => sign_keyed(&message, secret),
        };
        format_token(age, rounds, &signature)
    }
}

/// Constant-time comparison of two tokens.
fn tokens_equal(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
