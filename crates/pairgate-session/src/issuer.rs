//! Credential issuance hook: the external collaborator seam.
//!
//! Pairgate doesn't mint realtime-media or database credentials itself —
//! that's the deployment's credential service (a secrets manager, a token
//! builder, whatever the installation uses). This crate only defines the
//! [`CredentialIssuer`] trait: one async method that takes the channel
//! name and returns a [`CredentialBundle`] or an error. The authenticator
//! calls it after the pairing code has been proven valid and before the
//! exclusive grant is committed, so no credentials are issued for a code
//! that would be rejected anyway.
//!
//! Swapping implementations changes nothing else: a real issuer in
//! production, a canned one in development, a failing one in tests.

use pairgate_protocol::CredentialBundle;

use crate::SessionError;

/// Produces the credentials handed to a newly authorized controller.
///
/// # Trait bounds
///
/// - `Send + Sync` → the issuer is shared across request tasks.
/// - `'static` → it owns its data; it lives as long as the server.
///
/// # Errors
///
/// Implementations return [`SessionError::Upstream`] when credentials
/// cannot be produced. The authenticator treats this as an infrastructure
/// fault: surfaced to the caller as a server error, never counted as a
/// failed pairing attempt.
pub trait CredentialIssuer: Send + Sync + 'static {
    /// Issues credentials scoped to the given media channel.
    fn issue(
        &self,
        channel: &str,
    ) -> impl std::future::Future<Output = Result<CredentialBundle, SessionError>>
    + Send;
}
