//! A configuration-backed credential issuer.
//!
//! Production deployments implement [`CredentialIssuer`] against their
//! secrets manager and media-token service. This issuer serves everything
//! else: development, tests, and installations whose credentials are
//! provisioned statically. It hands out the configured realtime-database
//! credentials verbatim and mints a per-grant media token when a signing
//! certificate is configured — and an empty token when one is not, which
//! leaves the channel open rather than failing the authorization.

use pairgate_protocol::{ChannelGrant, CredentialBundle, Credentials};
use pairgate_session::{CredentialIssuer, SessionError};
use rand::Rng;

/// Issues a fixed credential set, with a fresh media token per grant.
#[derive(Debug, Clone)]
pub struct StaticCredentialIssuer {
    credentials: Credentials,
    media_app_id: String,
    media_certificate: Option<String>,
}

impl StaticCredentialIssuer {
    pub fn new(
        credentials: Credentials,
        media_app_id: impl Into<String>,
        media_certificate: Option<String>,
    ) -> Self {
        Self {
            credentials,
            media_app_id: media_app_id.into(),
            media_certificate,
        }
    }

    /// Builds an issuer from `PAIRGATE_*` environment variables.
    ///
    /// Missing variables become empty fields — the service still runs,
    /// it just hands out blanks, which is the development default.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        Self {
            credentials: Credentials {
                database_url: var("PAIRGATE_DB_URL"),
                project_id: var("PAIRGATE_DB_PROJECT_ID"),
                api_key: var("PAIRGATE_DB_API_KEY"),
                app_id: var("PAIRGATE_DB_APP_ID"),
                storage_bucket: var("PAIRGATE_DB_STORAGE_BUCKET"),
            },
            media_app_id: var("PAIRGATE_MEDIA_APP_ID"),
            media_certificate: std::env::var("PAIRGATE_MEDIA_CERTIFICATE")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }
}

impl CredentialIssuer for StaticCredentialIssuer {
    async fn issue(
        &self,
        channel: &str,
    ) -> Result<CredentialBundle, SessionError> {
        let token = match &self.media_certificate {
            Some(_) => mint_media_token(),
            None => {
                tracing::warn!(
                    channel,
                    "no media certificate configured, issuing empty token"
                );
                String::new()
            }
        };

        Ok(CredentialBundle {
            credentials: self.credentials.clone(),
            channel: ChannelGrant {
                name: channel.to_string(),
                app_id: self.media_app_id.clone(),
                token,
            },
        })
    }
}

/// Mints an opaque media token: 48 hex characters.
fn mint_media_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 24] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
