//! Development relay server for the draft channel.
//!
//! A stateless fanout used by `atelier relay`, local development, and the
//! integration tests. It stands in for the production backend's
//! publish/subscribe endpoint only: no auth store, no persistence, no media
//! storage — a connection presents a token, joins its proto's room, and
//! everything it says is forwarded to the room.

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;

use super::rooms::RoomRegistry;
use super::ws;

/// Configuration for the relay server.
pub struct RelayConfig {
    pub port: u16,
    /// When set, connections must present exactly this token. When unset,
    /// any non-empty token is accepted (local development).
    pub token: Option<String>,
    pub dev_mode: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: 4710,
            token: None,
            dev_mode: false,
        }
    }
}

/// Shared state handed to the WebSocket handler.
#[derive(Clone)]
pub struct RelayState {
    pub rooms: RoomRegistry,
    pub token: Option<String>,
}

/// Build the relay router. Exposed separately so tests can serve it on an
/// ephemeral port.
pub fn build_router(state: RelayState) -> Router {
    Router::new()
        .route("/ws/drafts", get(ws::draft_ws_handler))
        .route("/health", get(health_check))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

/// Start the relay and serve until ctrl-c.
pub async fn start_relay(config: RelayConfig) -> Result<()> {
    let state = RelayState {
        rooms: RoomRegistry::new(),
        token: config.token,
    };
    let mut app = build_router(state);

    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let host = if config.dev_mode { "0.0.0.0" } else { "127.0.0.1" };
    let addr = format!("{}:{}", host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    println!("Atelier draft relay running at ws://{}/ws/drafts", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Relay server error")?;

    println!("Relay shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    println!("\nShutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> Router {
        build_router(RelayState {
            rooms: RoomRegistry::new(),
            token: Some("secret".to_string()),
        })
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = test_router();
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ok");
    }

    /// A request with valid WebSocket handshake headers, so rejection
    /// status codes come from our handler, not the upgrade extractor.
    fn handshake_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("connection", "upgrade")
            .header("upgrade", "websocket")
            .header("sec-websocket-version", "13")
            .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_drafts_endpoint_rejects_bad_token_before_upgrade() {
        let app = test_router();
        let req = handshake_request(
            "/ws/drafts?token=wrong&proto_id=3&session_id=0d4e4f9e-94a1-4bd3-a61f-2c1c82014a92",
        );
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_drafts_endpoint_requires_scope_parameters() {
        let app = test_router();
        let req = handshake_request("/ws/drafts?token=secret");
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_relay_config_default() {
        let config = RelayConfig::default();
        assert_eq!(config.port, 4710);
        assert!(config.token.is_none());
        assert!(!config.dev_mode);
    }
}
