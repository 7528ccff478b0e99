//! Configuration for session behavior.

/// Timeouts and naming for the session lifecycle.
///
/// The defaults are the protocol's published constants; deployments rarely
/// change them. Tests do — a zero `stale_timeout_secs` makes every held
/// session immediately reclaimable, which is how time-dependent behavior
/// is tested without sleeping.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long (in seconds) a pairing code stays valid after issuance.
    ///
    /// Default: 1800 (30 minutes). Checked on every authentication.
    pub code_ttl_secs: u64,

    /// Age (in seconds) after which a held session is presumed abandoned
    /// and may be reclaimed by a new caller.
    ///
    /// Default: 60 seconds.
    pub stale_timeout_secs: u64,

    /// Prefix for the media channel name derived from each pairing code
    /// (`"<prefix>_<code>"`). Both ends compute the name locally.
    pub channel_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            code_ttl_secs: 1800,
            stale_timeout_secs: 60,
            channel_prefix: "pairgate".to_string(),
        }
    }
}

/// Thresholds for failed-authentication lockout.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Failed attempts from one (code, source) pair before a lockout is
    /// installed.
    ///
    /// Default: 5.
    pub max_failed_attempts: u32,

    /// Lockout duration in seconds once the threshold is reached.
    ///
    /// Default: 300 (5 minutes).
    pub lockout_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_secs: 300,
        }
    }
}
