//! Error types for the session core.

use pairgate_protocol::ProtocolError;
use pairgate_store::StoreError;

/// Everything that can go wrong deciding an authorization.
///
/// The first five variants are caller-correctable: the request itself was
/// wrong or lost a race, and (except for `RateLimited`, which IS the
/// lockout signal) they count against the caller's failed-attempt budget.
/// `Upstream` and `Store` are infrastructure faults: logged, surfaced as a
/// generic server error at the edge, never counted against the caller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request was malformed before any store access happened.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No session record exists under the presented code.
    #[error("session not found")]
    NotFound,

    /// The record exists but its TTL has elapsed.
    #[error("session expired")]
    Expired,

    /// Another controller holds the session, or won the grant race.
    /// `retry_after_secs` is set when the current lease has a known
    /// remaining lifetime (the stale timeout minus its age).
    #[error("session already held by another controller")]
    Conflict { retry_after_secs: Option<u64> },

    /// The (code, source) pair is locked out after too many failures.
    #[error("too many failed attempts, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The credential issuer could not produce credentials. Not a
    /// pairing-code error — the caller's attempt budget is untouched.
    #[error("credential issuer unavailable: {0}")]
    Upstream(String),

    /// The session store failed or timed out.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ProtocolError> for SessionError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidCode => {
                Self::InvalidInput("invalid pairing code format".into())
            }
        }
    }
}
