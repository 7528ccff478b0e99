//! Error types for the store layer.

/// Errors that can occur talking to the backing store.
///
/// The session layer decides per call site whether a store error is
/// surfaced to the caller (session reads/writes) or swallowed (rate-limit
/// bookkeeping, which fails open).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// The operation exceeded its deadline.
    #[error("store operation timed out")]
    Timeout,
}
