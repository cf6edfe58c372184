//! `RelayServer` — axum HTTP + WebSocket server.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use relay_store::MessageStore;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::history::HistoryBuffer;
use crate::shutdown::Shutdown;
use crate::websocket::registry::SessionRegistry;
use crate::websocket::session::run_ws_session;

/// Shared state accessible from axum handlers and session tasks.
#[derive(Clone)]
pub struct AppState {
    /// Live session registry and broadcast dispatcher.
    pub registry: Arc<SessionRegistry>,
    /// Bounded recent-message buffer.
    pub history: Arc<HistoryBuffer>,
    /// Durable message log; `None` disables persistence entirely.
    pub store: Option<Arc<MessageStore>>,
    /// Shutdown coordinator.
    pub shutdown: Arc<Shutdown>,
    /// When the server started.
    pub start_time: Instant,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

/// The relay server.
pub struct RelayServer {
    config: Arc<ServerConfig>,
    registry: Arc<SessionRegistry>,
    history: Arc<HistoryBuffer>,
    store: Option<Arc<MessageStore>>,
    shutdown: Arc<Shutdown>,
    start_time: Instant,
}

impl RelayServer {
    /// Create a new server. Pass `None` for `store` to run without
    /// persistence.
    #[must_use]
    pub fn new(config: ServerConfig, store: Option<Arc<MessageStore>>) -> Self {
        let history = Arc::new(HistoryBuffer::new(config.max_history));
        Self {
            config: Arc::new(config),
            registry: Arc::new(SessionRegistry::new()),
            history,
            store,
            shutdown: Arc::new(Shutdown::new()),
            start_time: Instant::now(),
        }
    }

    /// Build the axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            registry: self.registry.clone(),
            history: self.history.clone(),
            store: self.store.clone(),
            shutdown: self.shutdown.clone(),
            start_time: self.start_time,
            config: self.config.clone(),
        };

        Router::new()
            .route("/ws", get(ws_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and start serving.
    ///
    /// Returns the bound address (useful with port `0`) and the serve
    /// task's handle. The task exits after [`Shutdown::trigger`] once all
    /// sessions have wound down.
    pub async fn listen(&self) -> std::io::Result<(std::net::SocketAddr, JoinHandle<()>)> {
        let listener =
            TcpListener::bind(format!("{}:{}", self.config.host, self.config.port)).await?;
        let addr = listener.local_addr()?;
        let app = self.router();
        let token = self.shutdown.token();

        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(e) = result {
                error!(error = %e, "server error");
            }
        });

        Ok((addr, handle))
    }

    /// Get the session registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Get the history buffer.
    pub fn history(&self) -> &Arc<HistoryBuffer> {
        &self.history
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<Shutdown> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Query parameters accepted on the WebSocket upgrade URL.
#[derive(Debug, Deserialize)]
struct ConnectQuery {
    /// Self-declared username; absent or empty is accepted as-is.
    #[serde(default)]
    username: String,
}

/// GET /ws — WebSocket upgrade.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<ConnectQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| run_ws_session(socket, query.username, state))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.registry.count().await;
    Json(health::health_check(
        state.start_time,
        connections,
        state.history.len(),
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn make_server() -> RelayServer {
        RelayServer::new(ServerConfig::default(), None)
    }

    #[tokio::test]
    async fn server_with_default_config() {
        let server = make_server();
        assert_eq!(server.config().host, "127.0.0.1");
        assert_eq!(server.config().port, 0);
        assert_eq!(server.history().capacity(), 100);
    }

    #[tokio::test]
    async fn registry_starts_empty() {
        let server = make_server();
        assert_eq!(server.registry().count().await, 0);
    }

    #[test]
    fn shutdown_coordinator_accessible() {
        let server = make_server();
        assert!(!server.shutdown().is_triggered());
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let server = make_server();
        let app = server.router();

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["connections"], 0);
        assert_eq!(parsed["history_messages"], 0);
    }

    #[tokio::test]
    async fn ws_route_rejects_plain_get() {
        let server = make_server();
        let app = server.router();

        // No upgrade headers: the route exists but the upgrade is refused.
        let req = Request::builder().uri("/ws").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_ne!(resp.status(), StatusCode::NOT_FOUND);
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let server = make_server();
        let app = server.router();

        let req = Request::builder()
            .uri("/nonexistent")
            .body(Body::empty())
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listen_binds_auto_assigned_port() {
        let server = make_server();
        let (addr, handle) = server.listen().await.unwrap();
        assert_ne!(addr.port(), 0);

        server.shutdown().trigger();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("shutdown timed out")
            .expect("join error");
    }

    #[tokio::test]
    async fn listen_fails_on_unbindable_host() {
        let config = ServerConfig {
            host: "256.256.256.256".into(),
            ..ServerConfig::default()
        };
        let server = RelayServer::new(config, None);
        assert!(server.listen().await.is_err());
    }

    #[tokio::test]
    async fn server_with_custom_config() {
        let config = ServerConfig {
            host: "0.0.0.0".into(),
            port: 9090,
            max_history: 10,
            ..ServerConfig::default()
        };
        let server = RelayServer::new(config, None);
        assert_eq!(server.config().host, "0.0.0.0");
        assert_eq!(server.config().port, 9090);
        assert_eq!(server.history().capacity(), 10);
    }
}
