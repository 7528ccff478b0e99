//! Record types: the rows that live in the store's two keyspaces.
//!
//! A [`SessionRecord`] is the server's complete knowledge of one pairing
//! code. It tracks:
//! - WHICH device issued the code (`device_id`)
//! - WHEN the code stops working (`expires_at`)
//! - WHO currently holds exclusive control (`connected`,
//!   `authorized_source`)
//! - HOW the holder proves itself on reconnection (`connection_token`)
//!
//! All timestamps are epoch milliseconds from the server clock. The store
//! is the single source of truth — no copy of these fields is cached in
//! process memory between requests.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// The lifecycle status of a session, paired with the `connected` flag.
///
/// ```text
///   Active ──(grant)──→ Connected ──(disconnect)──→ Disconnected
///                           │                            │
///                           └──(stale reclaim)──→ DisconnectedStale
///                                                        │
///                              (next grant) ←────────────┘
/// ```
///
/// `status` is descriptive; the authoritative mutual-exclusion bit is
/// [`SessionRecord::connected`]. The two move together: every transition
/// that flips `connected` also sets the matching status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Freshly registered, never held.
    Active,
    /// A controller currently holds exclusive control.
    Connected,
    /// The holder released the session through a disconnect.
    Disconnected,
    /// A stale holder was evicted by a reclaiming caller.
    DisconnectedStale,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::DisconnectedStale => write!(f, "disconnected_stale"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// One session, keyed by its pairing code.
///
/// Created by the registrar; mutated only by the authenticator (grant and
/// stale-reclaim transitions) and the terminator (disconnect). Records are
/// never explicitly destroyed — once `expires_at` passes they fail every
/// authentication and are left for the store's own retention mechanism.
///
/// Invariant: at most one caller observes `connected == true` as theirs at
/// any instant. This is enforced by the conditional-write grant transition,
/// not by anything in this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Primary key. 6 characters, uppercase alphanumeric.
    pub pairing_code: String,

    /// The device that registered this session. Immutable.
    pub device_id: String,

    /// When the record was created (epoch ms).
    pub created_at: u64,

    /// `created_at` + the code TTL. Checked on every authentication.
    pub expires_at: u64,

    /// Descriptive lifecycle status, kept in step with `connected`.
    pub status: SessionStatus,

    /// The mutual-exclusion flag: `true` iff exactly one authorized
    /// controller currently holds the session.
    pub connected: bool,

    /// When the current/last grant was made (epoch ms).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<u64>,

    /// When the last explicit disconnect happened (epoch ms).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disconnected_at: Option<u64>,

    /// When a stale holder was last evicted (epoch ms).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_disconnect_at: Option<u64>,

    /// Proof-of-possession for idempotent reconnection. 32 hex chars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_token: Option<String>,

    /// Network origin bound to the current/last grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized_source: Option<String>,

    /// Media channel name, derived from the code at creation. Immutable.
    pub channel_name: String,
}

impl SessionRecord {
    /// Returns `true` if the code's TTL has elapsed at `now_ms`.
    ///
    /// The boundary is exclusive: a record observed exactly at
    /// `expires_at` is still valid.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    /// Milliseconds since the current grant was made.
    ///
    /// A connected record with no `connected_at` (which a conforming
    /// writer never produces) reads as held since the epoch, i.e. stale —
    /// the safe direction for reclamation.
    pub fn held_age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.connected_at.unwrap_or(0))
    }
}

// ---------------------------------------------------------------------------
// RateLimitRecord
// ---------------------------------------------------------------------------

/// Failed-attempt bookkeeping for one (pairing code, source address) pair.
///
/// Lives in its own keyspace with a lifecycle independent of the session:
/// created on the first failure, deleted on success. `lockout_until == 0`
/// means no lockout is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    pub pairing_code: String,
    pub source_address: String,
    pub failed_attempts: u32,
    /// Epoch ms until which the pair is locked out. 0 = not locked.
    pub lockout_until: u64,
    /// When the last failure was recorded (epoch ms). Informational.
    pub last_attempt: u64,
}

// =========================================================================
// Tests
// =========================================================================
