//! Release of exclusive control, idempotently.

use pairgate_store::{SessionStatus, SessionStore};

use crate::clock::now_ms;
use crate::SessionError;

/// Outcome of a disconnect request. All three variants are successes at
/// the protocol level — re-sending a disconnect is always safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The session was connected and is now released.
    Disconnected { disconnected_at: u64 },
    /// The record exists but no controller was connected.
    AlreadyDisconnected,
    /// No record exists under the code (expired and purged, or never
    /// issued).
    AlreadyGone,
}

/// Releases sessions. Deliberately requires no proof of ownership: any
/// caller who knows the code can force-release the current holder.
pub struct SessionTerminator<S> {
    store: S,
}

impl<S: SessionStore> SessionTerminator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Disconnects the session under `raw_code`.
    ///
    /// `device_id` is informational and only logged. Missing records and
    /// already-idle records are successes with a notice, not errors.
    ///
    /// # Errors
    /// [`SessionError::InvalidInput`] when the code is empty after
    /// trimming, [`SessionError::Store`] when the store fails.
    pub async fn disconnect(
        &self,
        raw_code: &str,
        device_id: &str,
    ) -> Result<Termination, SessionError> {
        let trimmed = raw_code.trim();
        if trimmed.is_empty() {
            return Err(SessionError::InvalidInput(
                "missing session_code parameter".into(),
            ));
        }
        let code = trimmed.to_ascii_uppercase();

        let record = match self.store.get(&code).await? {
            Some(record) => record,
            None => {
                tracing::debug!(
                    %code, device_id,
                    "disconnect for unknown session, treating as done"
                );
                return Ok(Termination::AlreadyGone);
            }
        };

        if !record.connected {
            tracing::debug!(%code, device_id, "session already disconnected");
            return Ok(Termination::AlreadyDisconnected);
        }

        let now = now_ms();
        let mut released = record;
        released.connected = false;
        released.status = SessionStatus::Disconnected;
        released.disconnected_at = Some(now);
        self.store.put(released).await?;

        tracing::info!(%code, device_id, "session disconnected");
        Ok(Termination::Disconnected {
            disconnected_at: now,
        })
    }
}

// =========================================================================
// Tests
// =========================================================================
