//! Unified error type for the service crate.

use pairgate_session::SessionError;
use pairgate_store::StoreError;

/// Top-level error that wraps the sub-crate errors.
///
/// When embedding the server, you deal with this single type; the `#[from]`
/// attributes let `?` convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PairgateError {
    /// A session-core error (authorization, registration, termination).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A store-layer error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Binding or serving the listener failed.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
