//! # Pairgate
//!
//! Pairing/session-authorization service for remote device control.
//!
//! A device registers and receives a short numeric pairing code; a viewer
//! presents that code and, if it wins the first-connect race, is granted
//! exactly-once exclusive control of the device's session for a bounded
//! window. This crate is the HTTP edge: it wires the session core to three
//! JSON endpoints, maps the error taxonomy to status codes, and ships a
//! binary that runs against the in-process store.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pairgate::{PairgateServerBuilder, StaticCredentialIssuer};
//! use pairgate_store::{MemoryRateLimitStore, MemorySessionStore};
//!
//! # async fn run() -> Result<(), pairgate::PairgateError> {
//! let server = PairgateServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(
//!         MemorySessionStore::new(),
//!         MemoryRateLimitStore::new(),
//!         StaticCredentialIssuer::from_env(),
//!     )
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handlers;
mod issuer;
mod server;

pub use error::PairgateError;
pub use issuer::StaticCredentialIssuer;
pub use server::{router, AppState, PairgateServer, PairgateServerBuilder};
