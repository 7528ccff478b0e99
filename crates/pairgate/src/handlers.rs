//! Request handlers: JSON in, status code + JSON out.
//!
//! Handlers stay thin — parse, delegate to the session core, translate
//! the outcome. The status mapping here is the wire contract's error
//! taxonomy; the human-readable messages are what a viewer UI shows to
//! the person holding the headset, so they name actions ("check code on
//! device display"), not internals.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use pairgate_protocol::{
    AuthenticateRequest, AuthenticateResponse, DisconnectRequest,
    DisconnectResponse, ErrorBody, RegisterRequest, RegisterResponse,
    SessionInfo,
};
use pairgate_session::{
    CredentialIssuer, SessionError, Termination,
};
use pairgate_store::{RateLimitStore, SessionStore};

use crate::server::AppState;

/// `POST /register` — a device asks for a pairing code.
pub(crate) async fn register<S, R, I>(
    State(state): State<Arc<AppState<S, R, I>>>,
    Json(req): Json<RegisterRequest>,
) -> Response
where
    S: SessionStore + Clone,
    R: RateLimitStore,
    I: CredentialIssuer,
{
    match state.registrar.register(&req.device_id).await {
        Ok(record) => (
            StatusCode::OK,
            Json(RegisterResponse {
                success: true,
                session_code: record.pairing_code,
                expires_at: record.expires_at,
                channel_name: record.channel_name,
                message: "Session registered successfully".into(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "registration failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("Failed to register session")),
            )
                .into_response()
        }
    }
}

/// `POST /authenticate` — a viewer presents a code and maybe a token.
pub(crate) async fn authenticate<S, R, I>(
    State(state): State<Arc<AppState<S, R, I>>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<AuthenticateRequest>,
) -> Response
where
    S: SessionStore + Clone,
    R: RateLimitStore,
    I: CredentialIssuer,
{
    let source = source_addr(&headers, peer);

    match state
        .authenticator
        .authenticate(&req.session_code, &req.connection_token, &source)
        .await
    {
        Ok(grant) => (
            StatusCode::OK,
            Json(AuthenticateResponse {
                success: true,
                credentials: grant.bundle.credentials,
                channel: grant.bundle.channel,
                session_info: SessionInfo {
                    session_code: grant.record.pairing_code,
                    device_id: grant.record.device_id,
                    expires_at: grant.record.expires_at,
                    channel_name: grant.record.channel_name,
                    connection_token: grant.connection_token,
                },
                message: "Authentication successful".into(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// `POST /disconnect` — release the session, idempotently.
pub(crate) async fn disconnect<S, R, I>(
    State(state): State<Arc<AppState<S, R, I>>>,
    Json(req): Json<DisconnectRequest>,
) -> Response
where
    S: SessionStore + Clone,
    R: RateLimitStore,
    I: CredentialIssuer,
{
    match state
        .terminator
        .disconnect(&req.session_code, &req.device_id)
        .await
    {
        Ok(Termination::Disconnected { disconnected_at }) => (
            StatusCode::OK,
            Json(DisconnectResponse {
                success: true,
                message: "Disconnected successfully".into(),
                warning: None,
                session_code: Some(
                    req.session_code.trim().to_ascii_uppercase(),
                ),
                disconnected_at: Some(disconnected_at),
            }),
        )
            .into_response(),
        Ok(Termination::AlreadyDisconnected) => (
            StatusCode::OK,
            Json(DisconnectResponse {
                success: true,
                message: "Session already disconnected".into(),
                warning: Some("controller was not connected".into()),
                session_code: None,
                disconnected_at: None,
            }),
        )
            .into_response(),
        Ok(Termination::AlreadyGone) => (
            StatusCode::OK,
            Json(DisconnectResponse {
                success: true,
                message: "Session not found (already expired or deleted)"
                    .into(),
                warning: Some("session may have already expired".into()),
                session_code: None,
                disconnected_at: None,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Resolves the caller's network origin: first `x-forwarded-for` entry
/// when a gateway supplies one, otherwise the socket peer address.
fn source_addr(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

/// Maps the session error taxonomy to status codes and wire messages.
fn error_response(err: SessionError) -> Response {
    let (status, body) = match &err {
        SessionError::InvalidInput(msg) => {
            (StatusCode::BAD_REQUEST, ErrorBody::new(capitalize(msg)))
        }
        SessionError::NotFound => (
            StatusCode::NOT_FOUND,
            ErrorBody::new("Session not found. Check code on device display."),
        ),
        SessionError::Expired => (
            StatusCode::FORBIDDEN,
            ErrorBody::new("Session expired. Device must generate new code."),
        ),
        SessionError::Conflict {
            retry_after_secs: Some(wait),
        } => (
            StatusCode::CONFLICT,
            ErrorBody::new(format!(
                "Device already connected. Disconnect first or wait {wait}s."
            )),
        ),
        SessionError::Conflict {
            retry_after_secs: None,
        } => (
            StatusCode::CONFLICT,
            ErrorBody::new("Another controller connected first. Try again."),
        ),
        SessionError::RateLimited { retry_after_secs } => (
            StatusCode::TOO_MANY_REQUESTS,
            ErrorBody::with_retry_after(
                format!(
                    "Too many failed attempts. Try again in {retry_after_secs} seconds."
                ),
                *retry_after_secs,
            ),
        ),
        SessionError::Upstream(_) => {
            tracing::error!(error = %err, "credential issuance failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Failed to retrieve credentials"),
            )
        }
        SessionError::Store(_) => {
            tracing::error!(error = %err, "store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Internal server error"),
            )
        }
    };

    (status, Json(body)).into_response()
}

/// Uppercases the first character, for user-facing messages built from
/// lowercase internal error text.
fn capitalize(msg: &str) -> String {
    let mut chars = msg.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
