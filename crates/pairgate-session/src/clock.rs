//! Server clock: epoch milliseconds, the unit every record field uses.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as epoch milliseconds.
///
/// A system clock before the epoch reads as 0 rather than panicking;
/// every consumer treats timestamps with saturating arithmetic.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
