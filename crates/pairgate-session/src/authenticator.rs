//! The authentication state machine: who gets exclusive control, and why.
//!
//! Every decision in this file follows the same two-phase shape:
//!
//! 1. **Advisory inspection** — the record is read once and branched on
//!    (idle / held-fresh / held-stale). This read is allowed to be stale;
//!    it exists to reject hopeless attempts cheaply and to avoid issuing
//!    credentials that would be thrown away.
//! 2. **Atomic commit** — the grant itself is a conditional write whose
//!    precondition the store evaluates against the record's *current*
//!    value. If a rival connected between phase 1 and phase 2, the
//!    precondition fails and the caller gets a conflict.
//!
//! Phase 2 is the only place mutual exclusion is actually enforced. Never
//! collapse the phases: the protocol is correct even if phase 1's record
//! is arbitrarily out of date.

use pairgate_protocol::{CredentialBundle, PairingCode};
use pairgate_store::{
    RateLimitStore, SessionRecord, SessionStatus, SessionStore,
};
use rand::Rng;

use crate::clock::now_ms;
use crate::{
    CredentialIssuer, RateLimitDecision, RateLimiter, SessionConfig,
    SessionError,
};

/// A successful authorization: credentials, the granted record, and the
/// token the caller must present to reconnect.
#[derive(Debug)]
pub struct AuthGrant {
    pub bundle: CredentialBundle,
    pub record: SessionRecord,
    pub connection_token: String,
}

/// Validates pairing codes and performs the exclusive-grant transition.
pub struct SessionAuthenticator<S, R, I> {
    store: S,
    limiter: RateLimiter<R>,
    issuer: I,
    config: SessionConfig,
}

impl<S, R, I> SessionAuthenticator<S, R, I>
where
    S: SessionStore,
    R: RateLimitStore,
    I: CredentialIssuer,
{
    pub fn new(
        store: S,
        limiter: RateLimiter<R>,
        issuer: I,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            limiter,
            issuer,
            config,
        }
    }

    /// Attempts to authorize `source` for the session under `raw_code`.
    ///
    /// `reconnect_token` is empty on a first connect and carries the token
    /// from a previous grant on reconnection attempts.
    ///
    /// The failure taxonomy and which failures count against the caller's
    /// attempt budget are load-bearing; see [`SessionError`].
    pub async fn authenticate(
        &self,
        raw_code: &str,
        reconnect_token: &str,
        source: &str,
    ) -> Result<AuthGrant, SessionError> {
        // Step 1: shape check. Runs before the limiter, so a malformed
        // code is rejected without touching either keyspace.
        let code = PairingCode::parse(raw_code)?;
        let code = code.as_str();

        // Step 2: lockout check.
        if let RateLimitDecision::Locked { retry_after_secs } =
            self.limiter.check(code, source).await
        {
            return Err(SessionError::RateLimited { retry_after_secs });
        }

        // Step 3: load the record. Store errors here are infrastructure
        // faults and do not count against the caller.
        let record = match self.store.get(code).await? {
            Some(record) => record,
            None => {
                tracing::debug!(%code, %source, "unknown pairing code");
                self.limiter.record_failure(code, source).await;
                return Err(SessionError::NotFound);
            }
        };

        // Step 4: TTL check.
        let now = now_ms();
        if record.is_expired(now) {
            tracing::info!(
                %code, %source,
                expired_ms_ago = now - record.expires_at,
                "attempt against expired session"
            );
            self.limiter.record_failure(code, source).await;
            return Err(SessionError::Expired);
        }

        // Step 5: advisory held-state branch. Decides which token the
        // grant will carry and rejects callers that cannot possibly win.
        let token = if record.connected {
            self.resolve_held(&record, reconnect_token, source, now)
                .await?
        } else {
            // Idle. A token left by a previous grant is reused so an old
            // holder's reconnect attempts stay recognizable; a fresh
            // record gets a fresh token.
            match record.connection_token.clone() {
                Some(t) if !t.is_empty() => t,
                _ => generate_connection_token(),
            }
        };

        // Step 6: credentials, before the grant is committed. Issuer
        // failure is not a pairing failure: no attempt is recorded.
        let bundle = self.issuer.issue(&record.channel_name).await?;

        // Step 7: the exclusive-grant transition. The precondition admits
        // an idle record, or a record already held by this very caller
        // (same token, same source) — that second arm is what makes
        // reconnection idempotent. Every other racer fails here.
        let applied = self
            .store
            .update_if(
                code,
                |r| {
                    !r.connected
                        || (r.connection_token.as_deref()
                            == Some(token.as_str())
                            && r.authorized_source.as_deref() == Some(source))
                },
                |r| {
                    r.connected = true;
                    r.connected_at = Some(now);
                    r.status = SessionStatus::Connected;
                    r.connection_token = Some(token.clone());
                    r.authorized_source = Some(source.to_string());
                },
            )
            .await?;

        if !applied {
            tracing::info!(
                %code, %source,
                "lost the grant race, another controller connected first"
            );
            self.limiter.record_failure(code, source).await;
            return Err(SessionError::Conflict {
                retry_after_secs: None,
            });
        }

        self.limiter.clear(code, source).await;

        tracing::info!(
            %code, %source,
            channel = %record.channel_name,
            "exclusive control granted"
        );

        let mut granted = record;
        granted.connected = true;
        granted.connected_at = Some(now);
        granted.status = SessionStatus::Connected;
        granted.connection_token = Some(token.clone());
        granted.authorized_source = Some(source.to_string());

        Ok(AuthGrant {
            bundle,
            record: granted,
            connection_token: token,
        })
    }

    /// Phase-1 handling of a record that reads as connected: legitimate
    /// reconnection, stale reclamation, or rejection.
    ///
    /// Returns the connection token the grant should carry.
    async fn resolve_held(
        &self,
        record: &SessionRecord,
        reconnect_token: &str,
        source: &str,
        now: u64,
    ) -> Result<String, SessionError> {
        let code = record.pairing_code.as_str();
        let reconnect_token = reconnect_token.trim();
        let stored = record.connection_token.as_deref().unwrap_or("");

        let is_holder = !reconnect_token.is_empty()
            && reconnect_token == stored
            && record.authorized_source.as_deref() == Some(source);

        if is_holder {
            tracing::info!(%code, %source, "holder re-asserting control");
            self.limiter.clear(code, source).await;
            return Ok(stored.to_string());
        }

        let age_ms = record.held_age_ms(now);
        let stale_timeout_ms = self.config.stale_timeout_secs * 1000;

        if age_ms > stale_timeout_ms {
            // The prior holder is presumed gone. This write is a
            // reclamation against an already-stale record, not a race
            // against a live one, so it is unconditional; the grant
            // itself is still gated by the step-7 precondition.
            let new_token = generate_connection_token();
            let mut reclaimed = record.clone();
            reclaimed.connected = false;
            reclaimed.status = SessionStatus::DisconnectedStale;
            reclaimed.stale_disconnect_at = Some(now);
            reclaimed.connection_token = Some(new_token.clone());
            reclaimed.authorized_source = Some(source.to_string());
            self.store.put(reclaimed).await?;

            tracing::info!(
                %code, %source,
                held_secs = age_ms / 1000,
                "stale connection cleared, proceeding with new grant"
            );
            self.limiter.clear(code, source).await;
            return Ok(new_token);
        }

        let retry_after_secs = (stale_timeout_ms - age_ms) / 1000;
        tracing::debug!(
            %code, %source, retry_after_secs,
            "session held by a live controller, rejecting"
        );
        self.limiter.record_failure(code, source).await;
        Err(SessionError::Conflict {
            retry_after_secs: Some(retry_after_secs),
        })
    }
}

/// Generates a connection token: 32 hex characters, 128 bits of entropy.
///
/// Only the server and the holder ever see it, and 2^128 possibilities
/// make guessing infeasible.
fn generate_connection_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
