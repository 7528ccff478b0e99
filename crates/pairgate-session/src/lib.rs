//! Session authorization core for Pairgate.
//!
//! This crate is the protocol's decision-making layer. It handles the full
//! life of a pairing session:
//!
//! 1. **Registration** — a device asks for a pairing code
//!    ([`SessionRegistrar`])
//! 2. **Authentication** — a viewer presents the code and either receives
//!    exclusive control or a precise reason why not
//!    ([`SessionAuthenticator`])
//! 3. **Rate limiting** — failed attempts per (code, source) are tracked
//!    and locked out ([`RateLimiter`])
//! 4. **Termination** — control is released, idempotently
//!    ([`SessionTerminator`])
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP edge (above)   ← maps SessionError to status codes
//!     ↕
//! Session core (this crate)   ← every authorization decision
//!     ↕
//! Store layer (below)   ← the only cross-request synchronization point
//! ```
//!
//! Each component holds a handle to the shared store and nothing else —
//! there is no in-process session state, so any number of concurrent
//! requests (or server instances over a shared store) coordinate purely
//! through the store's conditional write.

#![allow(async_fn_in_trait)]

mod authenticator;
mod clock;
mod config;
mod error;
mod issuer;
mod limiter;
mod registrar;
mod terminator;

pub use authenticator::{AuthGrant, SessionAuthenticator};
pub use config::{RateLimitConfig, SessionConfig};
pub use error::SessionError;
pub use issuer::CredentialIssuer;
pub use limiter::{RateLimitDecision, RateLimiter};
pub use registrar::SessionRegistrar;
pub use terminator::{SessionTerminator, Termination};
