//! Pairing-code issuance: a device asks for a code, a record is born.

use pairgate_protocol::CODE_LENGTH;
use pairgate_store::{SessionRecord, SessionStatus, SessionStore};
use rand::Rng;

use crate::clock::now_ms;
use crate::{SessionConfig, SessionError};

/// The 36-symbol alphabet codes are sampled from.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// How many times a freshly sampled code is probed for collisions before
/// we accept whatever we have. 36^6 codes make a surviving collision
/// astronomically unlikely; the probe is best-effort, not a guarantee —
/// the check-then-put is not atomic and is knowingly left that way.
const MAX_COLLISION_PROBES: usize = 5;

/// Issues pairing codes and creates their session records.
pub struct SessionRegistrar<S> {
    store: S,
    config: SessionConfig,
}

impl<S: SessionStore> SessionRegistrar<S> {
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Registers a new session for `device_id`.
    ///
    /// Samples a 6-character code, probes the store for collisions
    /// (regenerating on hit), then writes the record unconditionally:
    /// `expires_at = now + TTL`, not connected, channel name derived from
    /// the code so both ends can compute it without another round trip.
    ///
    /// # Errors
    /// Only the final write surfaces a [`SessionError::Store`] — collision
    /// probes that fail are logged and skipped (a dead probe must not stop
    /// a device from getting a code).
    pub async fn register(
        &self,
        device_id: &str,
    ) -> Result<SessionRecord, SessionError> {
        let mut code = generate_code();

        for _ in 0..MAX_COLLISION_PROBES {
            match self.store.get(&code).await {
                Ok(Some(_)) => {
                    tracing::debug!(%code, "pairing code collision, regenerating");
                    code = generate_code();
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(
                        %code, error = %e,
                        "collision probe failed, accepting code unprobed"
                    );
                    break;
                }
            }
        }

        let now = now_ms();
        let record = SessionRecord {
            pairing_code: code.clone(),
            device_id: device_id.to_string(),
            created_at: now,
            expires_at: now + self.config.code_ttl_secs * 1000,
            status: SessionStatus::Active,
            connected: false,
            connected_at: None,
            disconnected_at: None,
            stale_disconnect_at: None,
            connection_token: None,
            authorized_source: None,
            channel_name: format!("{}_{code}", self.config.channel_prefix),
        };

        self.store.put(record.clone()).await?;

        tracing::info!(
            %code,
            device_id,
            expires_at = record.expires_at,
            channel = %record.channel_name,
            "session registered"
        );

        Ok(record)
    }
}

/// Samples a pairing code: 6 characters, uniform over `A-Z0-9`.
fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

// =========================================================================
// Tests
// =========================================================================
