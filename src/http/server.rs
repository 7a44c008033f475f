//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway middleware and handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve the RSA public key to clients
//! - Forward accepted requests to the upstream application
//! - Run the idle session sweeper alongside the listener

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{EncryptionConfig, GatewayConfig};
use crate::crypto::{CryptoError, RsaKeyPair};
use crate::error::GatewayError;
use crate::gateway::{gateway_middleware, GatewayState, Pipeline};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::lifecycle::signals::shutdown_signal;
use crate::store::{SessionSweeper, Services};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
    /// Base64 SPKI DER of the server key.
    pub public_key: Arc<str>,
}

/// HTTP server for the login gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    services: Services,
}

impl HttpServer {
    /// Create a server with in-memory collaborators.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let keys = load_server_keys(&config.encryption)?;
        let services = Services::in_memory(&config);
        Self::with_services(config, services, keys)
    }

    /// Create a server around caller-supplied collaborators and key.
    pub fn with_services(
        config: GatewayConfig,
        services: Services,
        keys: RsaKeyPair,
    ) -> Result<Self, GatewayError> {
        let upstream = Authority::from_str(&config.upstream.address)
            .map_err(|_| GatewayError::Address(config.upstream.address.clone()))?;
        let public_key: Arc<str> = keys.public_key_base64()?.into();

        let keys = Arc::new(keys);
        let pipeline = Arc::new(Pipeline::standard(&config, &services, keys));
        let gateway = GatewayState::new(&config, pipeline, &services);

        let state = AppState {
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
            upstream,
            public_key,
        };

        let router = Self::build_router(&config, state, gateway);
        Ok(Self {
            router,
            config,
            services,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState, gateway: GatewayState) -> Router {
        let public_key_route = format!(
            "{}{}",
            config.security.context_path, config.security.public_key_path
        );

        Router::new()
            .route(&public_key_route, get(public_key_handler))
            .fallback(forward_handler)
            .with_state(state)
            .layer(middleware::from_fn_with_state(gateway, gateway_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// The assembled router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server and session sweeper until a signal arrives or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            "HTTP server starting"
        );

        let sweeper = SessionSweeper::new(
            self.services.sessions.clone(),
            self.services.registry.clone(),
            Duration::from_secs(self.config.session.sweep_interval_secs),
        );
        let sweeper = tokio::spawn(sweeper.run(shutdown.resubscribe()));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {},
                    _ = shutdown.recv() => {},
                }
            })
            .await?;
        sweeper.abort();

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Load the configured private key, or generate one for this process.
pub fn load_server_keys(config: &EncryptionConfig) -> Result<RsaKeyPair, CryptoError> {
    match &config.private_key_path {
        Some(path) => {
            let keys = RsaKeyPair::load(Path::new(path))?;
            tracing::info!(path = %path, "Loaded server RSA key");
            Ok(keys)
        }
        None => {
            tracing::warn!(
                bits = config.key_bits,
                "No private key configured, generating an ephemeral RSA key"
            );
            RsaKeyPair::generate(config.key_bits)
        }
    }
}

async fn public_key_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "publicKey": &*state.public_key }))
}

/// Relay a request to the upstream application.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request.request_id().to_string();
    let (parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    let uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream URI rejected");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    let mut upstream_request = Request::from_parts(parts, body);
    *upstream_request.uri_mut() = uri;

    match state.client.request(upstream_request).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::ServiceExt;

    fn server(config: GatewayConfig) -> HttpServer {
        let keys = RsaKeyPair::generate(1024).unwrap();
        let services = Services::in_memory(&config);
        HttpServer::with_services(config, services, keys).unwrap()
    }

    #[tokio::test]
    async fn test_public_key_endpoint() {
        let mut config = GatewayConfig::default();
        config.security.context_path = "/admin".into();
        let response = server(config)
            .router()
            .oneshot(
                Request::builder()
                    .uri("/admin/gateway/public-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(crate::crypto::rsa::parse_public_key(json["publicKey"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        let mut config = GatewayConfig::default();
        config.upstream.address = "127.0.0.1:1".into();
        let response = server(config)
            .router()
            .oneshot(Request::builder().uri("/anything").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_bad_upstream_address() {
        let mut config = GatewayConfig::default();
        config.upstream.address = "not an authority".into();
        let keys = RsaKeyPair::generate(1024).unwrap();
        let services = Services::in_memory(&config);
        assert!(matches!(
            HttpServer::with_services(config, services, keys),
            Err(GatewayError::Address(_))
        ));
    }
}
