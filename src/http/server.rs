//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all route handlers under the base path
//! - Wire up the middleware chain in its fixed order (CORS, common
//!   headers, body limit, deadline)
//! - Attach the error normalizer around every failure path
//! - Bind plaintext or TLS listener per config
//! - Enable response compression at a fixed moderate level

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::post,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
    CompressionLevel,
};

use crate::config::GatewayConfig;
use crate::http::error;
use crate::http::handlers::{self, AppState};
use crate::http::request::MakeRequestUuid;
use crate::http::status::{self, TaxonomyError};
use crate::token::TokenService;

/// Fixed response compression level, matching a moderate gzip setting.
const COMPRESSION_LEVEL: CompressionLevel = CompressionLevel::Precise(5);

/// HTTP server for the onboarding gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and token
    /// service proxy handle.
    ///
    /// Verifies the status taxonomy is complete before anything else;
    /// an incomplete taxonomy is fatal to startup.
    pub fn new(config: GatewayConfig, tokens: TokenService) -> Result<Self, TaxonomyError> {
        status::validate_taxonomy()?;

        let config = Arc::new(config);
        let state = AppState {
            config: config.clone(),
            tokens,
        };
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with the full middleware chain.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/onboarding", post(handlers::handle_onboarding_query))
            .route("/ingestion", post(handlers::handle_ingestion_query))
            .route("/token", post(handlers::handle_token_request));

        // Layers added later wrap the ones added earlier. Reading bottom
        // to top: request IDs and tracing wrap everything, the common
        // headers and the normalizer see every response (success,
        // preflight, or failure), and the deadline covers body ingestion
        // and handler execution.
        Router::new()
            .nest(&config.api.dx_api_base_path, api)
            .fallback(handlers::fallback)
            .with_state(state)
            .layer(CompressionLayer::new().quality(COMPRESSION_LEVEL))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(DefaultBodyLimit::disable())
            .layer(TimeoutLayer::new(Duration::from_millis(
                config.timeouts.request_ms,
            )))
            .layer(Self::cors_layer(config))
            .layer(middleware::from_fn(error::normalize_errors))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::EXPIRES,
                HeaderValue::from_static("0"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::PRAGMA,
                HeaderValue::from_static("no-cache"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-cache, no-store, must-revalidate, max-age=0"),
            ))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// CORS policy from config: any origin, fixed method and header sets.
    fn cors_layer(config: &GatewayConfig) -> CorsLayer {
        let methods: Vec<Method> = config
            .cors
            .allowed_methods
            .iter()
            .filter_map(|m| m.parse().ok())
            .collect();
        let headers: Vec<HeaderName> = config
            .cors
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers)
    }

    /// Run the server on a plaintext listener until shutdown.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            base_path = %self.config.api.dx_api_base_path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS until shutdown. Bind failure is fatal and
    /// propagates to the caller.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(
            address = %addr,
            base_path = %self.config.api.dx_api_base_path,
            "HTTPS server starting"
        );

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::bus::{Address, ServiceBus};
    use crate::token::{TokenService, TOKEN_ADDRESS};

    fn test_server() -> HttpServer {
        let bus = ServiceBus::new();
        let tokens = TokenService::create_proxy(
            &bus,
            Address::new(TOKEN_ADDRESS),
            Duration::from_millis(100),
        );
        HttpServer::new(GatewayConfig::default(), tokens).unwrap()
    }

    #[tokio::test]
    async fn unmatched_path_is_normalized_404() {
        let server = test_server();
        let response = server
            .router
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(
            response.headers()["cache-control"],
            "no-cache, no-store, must-revalidate, max-age=0"
        );
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["type"], "urn:dx:onb:resourceNotFound");
    }

    #[tokio::test]
    async fn every_response_carries_a_request_id() {
        let server = test_server();
        let response = server
            .router
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }
}
