//! Failed-attempt tracking and lockout per (pairing code, source address).
//!
//! The limiter exists to slow down code guessing, and for nothing else.
//! Two rules shape every method here:
//!
//! - **Fail open.** A store outage must never turn into a lockout storm on
//!   top of the outage. Any store error during a check admits the caller;
//!   errors during bookkeeping are logged and swallowed.
//! - **Only the threshold locks.** A fresh failure resets `lockout_until`
//!   to 0; reaching `max_failed_attempts` is the only thing that installs
//!   a lockout, and an elapsed lockout does not re-arm by itself — the
//!   caller gets to try again.

use pairgate_store::{RateLimitRecord, RateLimitStore};

use crate::clock::now_ms;
use crate::RateLimitConfig;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The attempt may proceed.
    Allowed,
    /// The pair is locked out for another `retry_after_secs` seconds.
    Locked { retry_after_secs: u64 },
}

/// Tracks failures and lockouts in the rate-limit keyspace.
pub struct RateLimiter<R> {
    store: R,
    config: RateLimitConfig,
}

impl<R: RateLimitStore> RateLimiter<R> {
    pub fn new(store: R, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    /// Decides whether an attempt from `source` against `code` may proceed.
    ///
    /// An active lockout denies with the remaining seconds. A pair at the
    /// failure threshold with no lockout recorded gets one installed now
    /// and is denied for the full duration. Everything else — including an
    /// elapsed lockout — is allowed.
    pub async fn check(&self, code: &str, source: &str) -> RateLimitDecision {
        let now = now_ms();

        let record = match self.store.get(code, source).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    %code, %source, error = %e,
                    "rate-limit check failed, failing open"
                );
                return RateLimitDecision::Allowed;
            }
        };

        let Some(record) = record else {
            return RateLimitDecision::Allowed;
        };

        if record.lockout_until > now {
            let retry_after_secs = (record.lockout_until - now) / 1000;
            tracing::debug!(
                %code, %source, retry_after_secs, "attempt during lockout"
            );
            return RateLimitDecision::Locked { retry_after_secs };
        }

        if record.failed_attempts >= self.config.max_failed_attempts
            && record.lockout_until == 0
        {
            let locked = RateLimitRecord {
                lockout_until: now + self.config.lockout_secs * 1000,
                last_attempt: now,
                ..record
            };
            if let Err(e) = self.store.put(locked).await {
                tracing::warn!(
                    %code, %source, error = %e,
                    "failed to install lockout, failing open"
                );
                return RateLimitDecision::Allowed;
            }
            tracing::info!(
                %code, %source, "lockout installed after repeated failures"
            );
            return RateLimitDecision::Locked {
                retry_after_secs: self.config.lockout_secs,
            };
        }

        RateLimitDecision::Allowed
    }

    /// Records one failed attempt, creating the record at 1 if absent.
    ///
    /// Clears any stale `lockout_until` — a failure after an elapsed
    /// lockout starts a fresh count toward the threshold rather than
    /// extending the old lockout.
    pub async fn record_failure(&self, code: &str, source: &str) {
        let now = now_ms();

        let prior = match self.store.get(code, source).await {
            Ok(Some(record)) => record.failed_attempts,
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!(
                    %code, %source, error = %e,
                    "could not read failure count, starting from zero"
                );
                0
            }
        };

        let record = RateLimitRecord {
            pairing_code: code.to_string(),
            source_address: source.to_string(),
            failed_attempts: prior + 1,
            lockout_until: 0,
            last_attempt: now,
        };

        match self.store.put(record).await {
            Ok(()) => tracing::debug!(
                %code, %source,
                failed_attempts = prior + 1,
                "failed attempt recorded"
            ),
            Err(e) => tracing::warn!(
                %code, %source, error = %e,
                "failed to record attempt"
            ),
        }
    }

    /// Deletes the pair's record. Called on every successful path.
    pub async fn clear(&self, code: &str, source: &str) {
        if let Err(e) = self.store.delete(code, source).await {
            tracing::warn!(
                %code, %source, error = %e,
                "failed to clear rate-limit record"
            );
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
