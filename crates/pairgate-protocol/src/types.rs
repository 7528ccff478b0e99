//! Request and response bodies for the three Pairgate operations.
//!
//! These are the structures that travel as JSON over HTTP. The exact field
//! names are part of the contract with device firmware and viewer clients,
//! so the serde attributes here are load-bearing — a rename breaks clients.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

/// Body of `POST /register`, sent by a device that wants a pairing code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Identifier of the device requesting the session.
    /// Devices without provisioned identity send a placeholder.
    #[serde(default = "default_device_id")]
    pub device_id: String,
}

fn default_device_id() -> String {
    "device_unknown".to_string()
}

/// Successful response to `POST /register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    /// The freshly issued 6-character pairing code.
    pub session_code: String,
    /// Epoch milliseconds after which the code is dead.
    pub expires_at: u64,
    /// Media channel name derived from the code. Both ends compute or
    /// receive this without a second round trip.
    pub channel_name: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Authenticate
// ---------------------------------------------------------------------------

/// Body of `POST /authenticate`, sent by a viewer presenting a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    /// The pairing code as typed by the user. Normalized server-side.
    #[serde(default)]
    pub session_code: String,
    /// Proof-of-possession token from a previous grant. Present only on
    /// reconnection attempts.
    #[serde(default)]
    pub connection_token: String,
}

/// Realtime-database credentials handed out by the issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub database_url: String,
    pub project_id: String,
    pub api_key: String,
    pub app_id: String,
    #[serde(default)]
    pub storage_bucket: String,
}

/// Realtime-media channel grant: which channel to join and the token
/// proving the viewer may join it.
///
/// `token` is empty when the issuer has no signing certificate configured —
/// the channel is then open, which is a deployment choice, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelGrant {
    pub name: String,
    pub app_id: String,
    #[serde(default)]
    pub token: String,
}

/// Everything the credential issuer produces for one authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBundle {
    pub credentials: Credentials,
    pub channel: ChannelGrant,
}

/// Session metadata echoed back to an authorized viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_code: String,
    pub device_id: String,
    pub expires_at: u64,
    pub channel_name: String,
    /// The token to present on future reconnection attempts.
    pub connection_token: String,
}

/// Successful response to `POST /authenticate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateResponse {
    pub success: bool,
    pub credentials: Credentials,
    pub channel: ChannelGrant,
    pub session_info: SessionInfo,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Disconnect
// ---------------------------------------------------------------------------

/// Body of `POST /disconnect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectRequest {
    #[serde(default)]
    pub session_code: String,
    /// Informational only — disconnect requires no proof of ownership.
    #[serde(default)]
    pub device_id: String,
}

/// Response to `POST /disconnect`. Always `success: true` for a well-formed
/// request; the optional `warning` distinguishes the idempotent no-op cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disconnected_at: Option<u64>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error body shared by all operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Human-readable description, suitable for display to the viewer.
    pub error: String,
    /// Seconds until the caller may retry. Set on rate-limit responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorBody {
    /// Builds an error body with no retry hint.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            retry_after: None,
        }
    }

    /// Builds an error body carrying a retry-after hint.
    pub fn with_retry_after(error: impl Into<String>, secs: u64) -> Self {
        Self {
            success: false,
            error: error.into(),
            retry_after: Some(secs),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
