//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the proxy, UI and relay handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Own the background sweepers for the cache and the session registry
//! - Serve until the shutdown broadcast fires

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cache::ResponseCache;
use crate::config::RelayConfig;
use crate::fetch::ContentFetcher;
use crate::http::{pages, proxy, websocket};
use crate::lifecycle::tasks;
use crate::relay::RelayDispatcher;
use crate::session::SessionRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: ContentFetcher,
    pub cache: Arc<ResponseCache>,
    pub relay: Arc<RelayDispatcher>,
    pub ui_dir: Arc<PathBuf>,
}

/// HTTP server for the content relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let fetcher = ContentFetcher::new(&config.fetch)?;
        let cache = Arc::new(ResponseCache::from_config(&config.cache));
        tracing::debug!(
            ttl_secs = cache.ttl().as_secs(),
            capacity = config.cache.capacity,
            policy = ?cache.policy(),
            "Response cache ready"
        );
        let sessions = Arc::new(SessionRegistry::new(config.sessions.ttl()));
        let relay = Arc::new(RelayDispatcher::new(sessions));

        let state = AppState {
            fetcher,
            cache,
            relay,
            ui_dir: Arc::new(PathBuf::from(&config.ui.dir)),
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let assets = ServeDir::new(state.ui_dir.as_path());

        Router::new()
            .route("/proxy", get(proxy::proxy_handler))
            .route("/", get(pages::viewer_page))
            .route("/phone", get(pages::controller_page))
            .route("/phone/{session_id}", get(pages::controller_page))
            .route("/ws", get(websocket::ws_handler))
            .fallback_service(assets)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let cache_sweeper = tasks::spawn_cache_sweeper(
            self.state.cache.clone(),
            self.config.cache.sweep_interval(),
            shutdown.resubscribe(),
        );
        let session_sweeper = tasks::spawn_session_sweeper(
            self.state.relay.clone(),
            self.config.sessions.sweep_interval(),
            shutdown.resubscribe(),
        );

        let app = self.router.into_make_service();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        cache_sweeper.abort();
        session_sweeper.abort();
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Shared state, for inspection by embedders and tests.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    fn server() -> HttpServer {
        HttpServer::new(RelayConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_proxy_without_url_is_rejected() {
        let response = server()
            .router
            .oneshot(Request::builder().uri("/proxy").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_client_request_id_is_propagated() {
        let request = Request::builder()
            .uri("/proxy")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();
        let response = server().router.oneshot(request).await.unwrap();

        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_invalid_target_renders_error_page() {
        let request = Request::builder()
            .uri("/proxy?url=https%3A%2F%2F")
            .body(Body::empty())
            .unwrap();
        let response = server().router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["content-type"], "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn test_unparsable_host_is_a_server_error() {
        let request = Request::builder()
            .uri("/proxy?url=exa%20mple.com")
            .body(Body::empty())
            .unwrap();
        let response = server().router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("exa mple.com"));
        assert!(body.contains("ERR_INVALID_URL"));
    }

    #[test]
    fn test_state_is_built_from_config() {
        let mut config = RelayConfig::default();
        config.cache.ttl_secs = 42;
        let server = HttpServer::new(config).unwrap();

        assert_eq!(server.state().cache.ttl(), Duration::from_secs(42));
        assert_eq!(server.config().cache.ttl_secs, 42);
        assert_eq!(server.state().relay.connections(), 0);
    }
}
