//! Integration tests for the Pairgate server: full HTTP round trips
//! against a real listener on an ephemeral port.
//!
//! Distinct caller origins are simulated with `x-forwarded-for`, which the
//! server prefers over the socket peer address — every test client here is
//! on loopback.

use std::net::SocketAddr;

use pairgate::{AppState, PairgateServerBuilder, StaticCredentialIssuer};
use pairgate_protocol::{
    ChannelGrant, CredentialBundle, Credentials,
};
use pairgate_session::{
    CredentialIssuer, RateLimitConfig, SessionConfig, SessionError,
};
use pairgate_store::{
    MemoryRateLimitStore, MemorySessionStore, SessionRecord, SessionStatus,
    SessionStore,
};
use serde_json::{json, Value};

// =========================================================================
// Test collaborators and harness
// =========================================================================

/// Issues a canned credential bundle for any channel.
struct TestIssuer;

impl CredentialIssuer for TestIssuer {
    async fn issue(
        &self,
        channel: &str,
    ) -> Result<CredentialBundle, SessionError> {
        Ok(CredentialBundle {
            credentials: Credentials {
                database_url: "https://db.test/".into(),
                project_id: "test".into(),
                api_key: "key".into(),
                app_id: "app".into(),
                storage_bucket: String::new(),
            },
            channel: ChannelGrant {
                name: channel.to_string(),
                app_id: "media-app".into(),
                token: "media-token".into(),
            },
        })
    }
}

/// Always refuses to issue.
struct DownIssuer;

impl CredentialIssuer for DownIssuer {
    async fn issue(
        &self,
        _channel: &str,
    ) -> Result<CredentialBundle, SessionError> {
        Err(SessionError::Upstream("issuer offline".into()))
    }
}

struct TestServer {
    addr: SocketAddr,
    sessions: MemorySessionStore,
    client: reqwest::Client,
}

impl TestServer {
    /// Starts a server on an ephemeral port with the given configs.
    async fn start(
        issuer: impl CredentialIssuer,
        session_config: SessionConfig,
        rate_limit_config: RateLimitConfig,
    ) -> Self {
        let sessions = MemorySessionStore::new();
        let server = PairgateServerBuilder::new()
            .bind("127.0.0.1:0")
            .session_config(session_config)
            .rate_limit_config(rate_limit_config)
            .build(sessions.clone(), MemoryRateLimitStore::new(), issuer)
            .await
            .expect("bind should succeed");

        let addr = server.local_addr().expect("ephemeral addr");
        tokio::spawn(server.run());

        Self {
            addr,
            sessions,
            client: reqwest::Client::new(),
        }
    }

    async fn start_default() -> Self {
        Self::start(
            TestIssuer,
            SessionConfig::default(),
            RateLimitConfig::default(),
        )
        .await
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// POSTs `body` to `path` with the given forwarded source origin.
    async fn post(
        &self,
        path: &str,
        source: &str,
        body: Value,
    ) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .header("x-forwarded-for", source)
            .json(&body)
            .send()
            .await
            .expect("request should complete");
        let status = resp.status().as_u16();
        let body: Value = resp.json().await.expect("JSON body");
        (status, body)
    }

    async fn register(&self) -> Value {
        let (status, body) = self
            .post("/register", "10.0.0.1", json!({"device_id": "r1"}))
            .await;
        assert_eq!(status, 200, "register failed: {body}");
        body
    }
}

// =========================================================================
// Register
// =========================================================================

#[tokio::test]
async fn test_register_returns_code_expiry_and_channel() {
    let server = TestServer::start_default().await;

    let body = server.register().await;

    assert_eq!(body["success"], true);
    let code = body["session_code"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert!(
        code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
        "code {code} must be uppercase alphanumeric"
    );
    assert_eq!(
        body["channel_name"].as_str().unwrap(),
        format!("pairgate_{code}")
    );
    assert!(body["expires_at"].as_u64().unwrap() > 0);
}

// =========================================================================
// The full pairing flow
// =========================================================================

#[tokio::test]
async fn test_full_flow_register_connect_conflict_disconnect_reconnect() {
    let server = TestServer::start_default().await;
    let code = server.register().await["session_code"]
        .as_str()
        .unwrap()
        .to_string();

    // First viewer connects and is granted exclusive control.
    let (status, body) = server
        .post("/authenticate", "1.2.3.4", json!({"session_code": code}))
        .await;
    assert_eq!(status, 200, "first connect: {body}");
    assert_eq!(body["session_info"]["session_code"], code.as_str());
    assert_eq!(body["session_info"]["device_id"], "r1");
    assert_eq!(body["channel"]["name"], format!("pairgate_{code}"));
    assert!(
        !body["session_info"]["connection_token"]
            .as_str()
            .unwrap()
            .is_empty()
    );

    // A second viewer within the stale window is rejected with a hint.
    let (status, body) = server
        .post("/authenticate", "5.6.7.8", json!({"session_code": code}))
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("wait"));

    // Disconnect releases the session.
    let (status, body) = server
        .post("/disconnect", "1.2.3.4", json!({"session_code": code}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert!(body["disconnected_at"].as_u64().is_some());

    // Now the second viewer gets in.
    let (status, _) = server
        .post("/authenticate", "5.6.7.8", json!({"session_code": code}))
        .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_reconnect_with_token_is_idempotent() {
    let server = TestServer::start_default().await;
    let code = server.register().await["session_code"]
        .as_str()
        .unwrap()
        .to_string();

    let (_, body) = server
        .post("/authenticate", "1.2.3.4", json!({"session_code": code}))
        .await;
    let token = body["session_info"]["connection_token"]
        .as_str()
        .unwrap()
        .to_string();

    for _ in 0..3 {
        let (status, body) = server
            .post(
                "/authenticate",
                "1.2.3.4",
                json!({"session_code": code, "connection_token": token}),
            )
            .await;
        assert_eq!(status, 200, "holder reconnection: {body}");
        assert_eq!(
            body["session_info"]["connection_token"].as_str().unwrap(),
            token
        );
    }
}

#[tokio::test]
async fn test_stale_session_is_reclaimed_by_new_origin() {
    let server = TestServer::start_default().await;
    let code = server.register().await["session_code"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, _) = server
        .post("/authenticate", "1.2.3.4", json!({"session_code": code}))
        .await;
    assert_eq!(status, 200);

    // Age the lease past the 60 s stale timeout by rewriting its
    // connected_at — the holder has silently gone away.
    let mut record = server.sessions.get(&code).await.unwrap().unwrap();
    record.connected_at = Some(record.connected_at.unwrap() - 120_000);
    server.sessions.put(record).await.unwrap();

    // Origin B's next attempt evicts A and holds.
    let (status, body) = server
        .post("/authenticate", "5.6.7.8", json!({"session_code": code}))
        .await;
    assert_eq!(status, 200, "reclaim: {body}");

    let record = server
        .sessions
        .get(&code)
        .await
        .unwrap()
        .expect("record exists");
    assert_eq!(record.authorized_source.as_deref(), Some("5.6.7.8"));
}

// =========================================================================
// Error statuses
// =========================================================================

#[tokio::test]
async fn test_authenticate_malformed_code_is_400() {
    let server = TestServer::start_default().await;
    let (status, body) = server
        .post("/authenticate", "1.2.3.4", json!({"session_code": "AB1"}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_authenticate_unknown_code_is_404() {
    let server = TestServer::start_default().await;
    let (status, _) = server
        .post(
            "/authenticate",
            "1.2.3.4",
            json!({"session_code": "ZZZZ99"}),
        )
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_authenticate_expired_code_is_403() {
    let server = TestServer::start_default().await;

    // Seed an already-expired record directly in the store.
    server
        .sessions
        .put(SessionRecord {
            pairing_code: "OLDOLD".into(),
            device_id: "r1".into(),
            created_at: 1_000,
            expires_at: 2_000,
            status: SessionStatus::Active,
            connected: false,
            connected_at: None,
            disconnected_at: None,
            stale_disconnect_at: None,
            connection_token: None,
            authorized_source: None,
            channel_name: "pairgate_OLDOLD".into(),
        })
        .await
        .unwrap();

    let (status, _) = server
        .post(
            "/authenticate",
            "1.2.3.4",
            json!({"session_code": "OLDOLD"}),
        )
        .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn test_authenticate_rate_limited_is_429_with_retry_after() {
    let server = TestServer::start_default().await;

    for _ in 0..5 {
        let (status, _) = server
            .post(
                "/authenticate",
                "9.9.9.9",
                json!({"session_code": "NOPE00"}),
            )
            .await;
        assert_eq!(status, 404);
    }

    let (status, body) = server
        .post(
            "/authenticate",
            "9.9.9.9",
            json!({"session_code": "NOPE00"}),
        )
        .await;
    assert_eq!(status, 429);
    let retry_after = body["retry_after"].as_u64().unwrap();
    assert!(retry_after <= 300);
}

#[tokio::test]
async fn test_authenticate_issuer_down_is_500() {
    let server = TestServer::start(
        DownIssuer,
        SessionConfig::default(),
        RateLimitConfig::default(),
    )
    .await;
    let code = server.register().await["session_code"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, body) = server
        .post("/authenticate", "1.2.3.4", json!({"session_code": code}))
        .await;
    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
}

// =========================================================================
// Disconnect idempotence
// =========================================================================

#[tokio::test]
async fn test_disconnect_unknown_code_is_success_with_warning() {
    let server = TestServer::start_default().await;
    let (status, body) = server
        .post("/disconnect", "1.2.3.4", json!({"session_code": "GONE00"}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert!(body["warning"].as_str().is_some());
}

#[tokio::test]
async fn test_disconnect_twice_is_success_both_times() {
    let server = TestServer::start_default().await;
    let code = server.register().await["session_code"]
        .as_str()
        .unwrap()
        .to_string();
    server
        .post("/authenticate", "1.2.3.4", json!({"session_code": code}))
        .await;

    let (status, _) = server
        .post("/disconnect", "1.2.3.4", json!({"session_code": code}))
        .await;
    assert_eq!(status, 200);

    let (status, body) = server
        .post("/disconnect", "1.2.3.4", json!({"session_code": code}))
        .await;
    assert_eq!(status, 200);
    assert!(body["warning"].as_str().is_some());
}

#[tokio::test]
async fn test_disconnect_missing_code_is_400() {
    let server = TestServer::start_default().await;
    let (status, body) =
        server.post("/disconnect", "1.2.3.4", json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

// =========================================================================
// CORS preflight
// =========================================================================

#[tokio::test]
async fn test_preflight_returns_cors_headers_and_empty_body() {
    let server = TestServer::start_default().await;

    let resp = server
        .client
        .request(
            reqwest::Method::OPTIONS,
            server.url("/authenticate"),
        )
        .header("origin", "https://viewer.example")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    assert!(resp.bytes().await.unwrap().is_empty());
}

// =========================================================================
// Embedding without the builder
// =========================================================================

#[tokio::test]
async fn test_router_can_be_served_standalone() {
    // The router is usable without PairgateServer, for embedders that
    // bring their own listener.
    let state = std::sync::Arc::new(AppState::new(
        MemorySessionStore::new(),
        MemoryRateLimitStore::new(),
        TestIssuer,
        SessionConfig::default(),
        RateLimitConfig::default(),
    ));
    let app = pairgate::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/register"))
        .json(&json!({"device_id": "r9"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

// Keep the static issuer exercised from the integration suite too: it is
// what the shipped binary runs.
#[tokio::test]
async fn test_static_issuer_serves_the_flow() {
    let issuer = StaticCredentialIssuer::new(
        Credentials {
            database_url: "https://db.prod/".into(),
            project_id: "prod".into(),
            api_key: "k".into(),
            app_id: "a".into(),
            storage_bucket: String::new(),
        },
        "media-app",
        None,
    );
    let server = TestServer::start(
        issuer,
        SessionConfig::default(),
        RateLimitConfig::default(),
    )
    .await;
    let code = server.register().await["session_code"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, body) = server
        .post("/authenticate", "1.2.3.4", json!({"session_code": code}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["credentials"]["project_id"], "prod");
    // No certificate configured: open channel, empty token.
    assert_eq!(body["channel"]["token"], "");
}
