//! The pairing code: the short token a device displays and a viewer types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Number of characters in a pairing code.
pub const CODE_LENGTH: usize = 6;

/// A validated 6-character pairing code.
///
/// This is a newtype wrapper around `String` so the rest of the system can
/// rely on two invariants without re-checking them:
///
/// 1. The code is exactly [`CODE_LENGTH`] characters.
/// 2. It has been normalized: surrounding whitespace stripped, letters
///    uppercased. `"ab12cd "` and `"AB12CD"` are the same code.
///
/// Normalization matters because the code is transcribed by a human from a
/// device display — case and stray whitespace are the viewer's problem,
/// not a reason to reject the session.
///
/// `#[serde(transparent)]` serializes the code as a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairingCode(String);

impl PairingCode {
    /// Parses and normalizes raw input into a pairing code.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidCode`] if the trimmed input is not
    /// exactly [`CODE_LENGTH`] characters. Content is not inspected beyond
    /// length — a well-formed code that doesn't exist in the store is the
    /// session layer's `NotFound`, not a format error.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.len() != CODE_LENGTH {
            return Err(ProtocolError::InvalidCode);
        }
        Ok(Self(normalized))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the code, returning the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PairingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
