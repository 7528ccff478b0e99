//! pairgate: the pairing/session-authorization service binary.
//!
//! Runs the HTTP edge against the in-process store. Credentials for the
//! static issuer come from `PAIRGATE_*` environment variables; everything
//! else is flags.

use clap::Parser;
use pairgate::{PairgateServerBuilder, StaticCredentialIssuer};
use pairgate_session::{RateLimitConfig, SessionConfig};
use pairgate_store::{MemoryRateLimitStore, MemorySessionStore};

#[derive(Parser)]
#[command(
    name = "pairgate",
    about = "Pairing-code session authorization service"
)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Pairing-code TTL in seconds.
    #[arg(long, default_value_t = 1800)]
    code_ttl: u64,

    /// Age in seconds after which a held session becomes reclaimable.
    #[arg(long, default_value_t = 60)]
    stale_timeout: u64,

    /// Failed attempts per (code, source) before lockout.
    #[arg(long, default_value_t = 5)]
    max_failed_attempts: u32,

    /// Lockout duration in seconds.
    #[arg(long, default_value_t = 300)]
    lockout: u64,

    /// Prefix for derived media channel names.
    #[arg(long, default_value = "pairgate")]
    channel_prefix: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pairgate=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let server = PairgateServerBuilder::new()
        .bind(&args.bind)
        .session_config(SessionConfig {
            code_ttl_secs: args.code_ttl,
            stale_timeout_secs: args.stale_timeout,
            channel_prefix: args.channel_prefix,
        })
        .rate_limit_config(RateLimitConfig {
            max_failed_attempts: args.max_failed_attempts,
            lockout_secs: args.lockout,
        })
        .build(
            MemorySessionStore::new(),
            MemoryRateLimitStore::new(),
            StaticCredentialIssuer::from_env(),
        )
        .await
        .expect("failed to bind server");

    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "server exited with error");
    }
}
