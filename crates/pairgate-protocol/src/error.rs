//! Error types for the protocol layer.

/// Errors that can occur at the wire-format level.
///
/// The only validation this layer performs is on the pairing code itself;
/// everything else (unknown codes, expired sessions, conflicts) is decided
/// by the session layer, which has access to the store.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The pairing code is missing or has the wrong shape.
    ///
    /// A valid code is exactly 6 characters after trimming. This check is
    /// deliberately shallow — a well-formed code that simply doesn't exist
    /// is a session-layer `NotFound`, not a protocol error.
    #[error("invalid pairing code format")]
    InvalidCode,
}
