//! `PairgateServer` builder and server wiring.
//!
//! This ties the layers together: store → session core → HTTP router.
//! Every request handler task gets the shared [`AppState`] and nothing
//! else; all cross-request coordination lives in the store.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderName, Method};
use axum::routing::post;
use axum::Router;
use pairgate_session::{
    CredentialIssuer, RateLimitConfig, RateLimiter, SessionAuthenticator,
    SessionConfig, SessionRegistrar, SessionTerminator,
};
use pairgate_store::{RateLimitStore, SessionStore};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::PairgateError;

/// Shared server state handed to each request handler.
///
/// The three components each hold their own handle to the same session
/// store; the store is the shared substrate, not this struct.
pub struct AppState<S, R, I> {
    pub(crate) registrar: SessionRegistrar<S>,
    pub(crate) authenticator: SessionAuthenticator<S, R, I>,
    pub(crate) terminator: SessionTerminator<S>,
}

impl<S, R, I> AppState<S, R, I>
where
    S: SessionStore + Clone,
    R: RateLimitStore,
    I: CredentialIssuer,
{
    pub fn new(
        sessions: S,
        rate_limits: R,
        issuer: I,
        session_config: SessionConfig,
        rate_limit_config: RateLimitConfig,
    ) -> Self {
        Self {
            registrar: SessionRegistrar::new(
                sessions.clone(),
                session_config.clone(),
            ),
            authenticator: SessionAuthenticator::new(
                sessions.clone(),
                RateLimiter::new(rate_limits, rate_limit_config),
                issuer,
                session_config,
            ),
            terminator: SessionTerminator::new(sessions),
        }
    }
}

/// Builds the router: the three operations plus CORS preflight handling.
///
/// The CORS layer answers `OPTIONS` preflights itself with the fixed
/// header set (any origin, `POST`/`OPTIONS`, `content-type`/`x-api-key`)
/// and an empty success body.
pub fn router<S, R, I>(state: Arc<AppState<S, R, I>>) -> Router
where
    S: SessionStore + Clone,
    R: RateLimitStore,
    I: CredentialIssuer,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-api-key"),
        ]);

    Router::new()
        .route("/register", post(handlers::register::<S, R, I>))
        .route("/authenticate", post(handlers::authenticate::<S, R, I>))
        .route("/disconnect", post(handlers::disconnect::<S, R, I>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Builder for configuring and starting a Pairgate server.
///
/// # Example
///
/// ```rust,ignore
/// let server = PairgateServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(sessions, rate_limits, issuer)
///     .await?;
/// server.run().await
/// ```
pub struct PairgateServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    rate_limit_config: RateLimitConfig,
}

impl PairgateServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
            rate_limit_config: RateLimitConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the rate-limit configuration.
    pub fn rate_limit_config(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit_config = config;
        self
    }

    /// Binds the listener and assembles the server.
    pub async fn build<S, R, I>(
        self,
        sessions: S,
        rate_limits: R,
        issuer: I,
    ) -> Result<PairgateServer<S, R, I>, PairgateError>
    where
        S: SessionStore + Clone,
        R: RateLimitStore,
        I: CredentialIssuer,
    {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "listener bound");

        let state = Arc::new(AppState::new(
            sessions,
            rate_limits,
            issuer,
            self.session_config,
            self.rate_limit_config,
        ));

        Ok(PairgateServer { listener, state })
    }
}

impl Default for PairgateServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Pairgate server.
///
/// Call [`run()`](Self::run) to start serving requests.
pub struct PairgateServer<S, R, I> {
    listener: TcpListener,
    state: Arc<AppState<S, R, I>>,
}

impl<S, R, I> PairgateServer<S, R, I>
where
    S: SessionStore + Clone,
    R: RateLimitStore,
    I: CredentialIssuer,
{
    /// Creates a new builder.
    pub fn builder() -> PairgateServerBuilder {
        PairgateServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until the process is terminated.
    ///
    /// Connect info is attached so handlers can read the peer address —
    /// the fallback source origin when no forwarding header is present.
    pub async fn run(self) -> Result<(), PairgateError> {
        tracing::info!("pairgate server running");
        let app = router(Arc::clone(&self.state));
        axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }
}
