//! Store abstraction layer for Pairgate.
//!
//! All coordination between concurrent requests happens through the store —
//! there is no shared in-process session state anywhere else. This crate
//! provides:
//!
//! - the record types ([`SessionRecord`], [`RateLimitRecord`]) that live in
//!   the store's two independent keyspaces,
//! - the [`SessionStore`] and [`RateLimitStore`] traits that the session
//!   layer is written against, and
//! - an in-process implementation ([`MemorySessionStore`],
//!   [`MemoryRateLimitStore`]) used by the bundled binary and by tests.
//!
//! # The conditional write
//!
//! [`SessionStore::update_if`] is the protocol's sole mutual-exclusion
//! primitive: the predicate is evaluated against the record's current value
//! at commit time, atomically with the update. A read-modify-write sequence
//! is NOT an acceptable implementation — the whole point is to close the
//! gap between a stale read and the commit.
//!
//! # Feature Flags
//!
//! - `memory` (default) — the in-process store implementation.

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "memory")]
mod memory;
mod record;

pub use error::StoreError;
#[cfg(feature = "memory")]
pub use memory::{MemoryRateLimitStore, MemorySessionStore};
pub use record::{RateLimitRecord, SessionRecord, SessionStatus};

/// The session-record keyspace, keyed by pairing code.
///
/// Implementations must provide read-after-write consistency and an atomic
/// conditional update. Operations should carry their own bounded deadlines
/// and surface overruns as [`StoreError::Timeout`] — no call may block
/// indefinitely.
///
/// Methods are declared in the desugared `impl Future + Send` form (rather
/// than `async fn`) because their futures cross task boundaries: request
/// handlers that call the store are themselves spawned. Implementors still
/// just write `async fn`.
pub trait SessionStore: Send + Sync + 'static {
    /// Fetches the record for a pairing code, if one exists.
    fn get(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<Option<SessionRecord>, StoreError>>
    + Send;

    /// Writes a record unconditionally, replacing any previous value.
    fn put(
        &self,
        record: SessionRecord,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Atomically updates the record under `code` if `predicate` holds
    /// against its current value.
    ///
    /// Returns `Ok(true)` if the update was applied, `Ok(false)` if the
    /// predicate failed or no record exists — both mean some other caller
    /// got there first, and the distinction doesn't matter to the protocol.
    ///
    /// The predicate and the mutation must be applied as one atomic step
    /// against the store's current value, not against an earlier read.
    fn update_if<P, U>(
        &self,
        code: &str,
        predicate: P,
        apply: U,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send
    where
        P: FnOnce(&SessionRecord) -> bool + Send,
        U: FnOnce(&mut SessionRecord) + Send;

    /// Deletes the record for a pairing code. Deleting a missing record
    /// is not an error.
    fn delete(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// The rate-limit keyspace, keyed by (pairing code, source address).
///
/// Independent from the session keyspace; no operation spans both.
pub trait RateLimitStore: Send + Sync + 'static {
    /// Fetches the rate-limit record for a (code, source) pair.
    fn get(
        &self,
        code: &str,
        source: &str,
    ) -> impl std::future::Future<Output = Result<Option<RateLimitRecord>, StoreError>>
    + Send;

    /// Writes a record unconditionally.
    fn put(
        &self,
        record: RateLimitRecord,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Deletes the record for a (code, source) pair. Deleting a missing
    /// record is not an error.
    fn delete(
        &self,
        code: &str,
        source: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
