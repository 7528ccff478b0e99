//! Wire protocol for Pairgate.
//!
//! This crate defines the "language" that devices, viewers, and the service
//! speak over HTTP:
//!
//! - **Types** ([`RegisterRequest`], [`AuthenticateResponse`], etc.) — the
//!   JSON bodies of the three operations.
//! - **PairingCode** ([`PairingCode`]) — the 6-character rendezvous code
//!   and its validation rules.
//! - **Credentials** ([`CredentialBundle`]) — what the credential issuer
//!   hands a newly authorized viewer.
//! - **Errors** ([`ProtocolError`]) — what can go wrong at this layer.
//!
//! # Architecture
//!
//! The protocol layer sits below everything else. It doesn't know about
//! stores or sessions — it only knows the shapes that travel on the wire.
//!
//! ```text
//! HTTP edge (bodies) → Protocol (typed wire structs) → Session (decisions)
//! ```

mod code;
mod error;
mod types;

pub use code::{PairingCode, CODE_LENGTH};
pub use error::ProtocolError;
pub use types::{
    AuthenticateRequest, AuthenticateResponse, ChannelGrant,
    CredentialBundle, Credentials, DisconnectRequest, DisconnectResponse,
    ErrorBody, RegisterRequest, RegisterResponse, SessionInfo,
};
