//! Shared utilities for integration tests.

use axum::{
    body::Bytes,
    http::{header, HeaderValue, Method, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use login_gateway::crypto::RsaKeyPair;
use login_gateway::store::{
    InMemoryRememberMeStore, InMemorySessionRegistry, InMemorySessionStore, InMemoryUserLoader,
    Principal, RememberMeToken, Services, SystemSettings,
};
use login_gateway::{GatewayConfig, HttpServer, Shutdown};

/// Start an upstream that echoes `METHOD path body` back.
///
/// A login carrying `password=123456` is accepted for user "sa": the reply
/// names the user in `x-login-user` and sets a remember-me cookie.
pub async fn start_echo_backend(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();
    let app = Router::new().fallback(|method: Method, uri: Uri, body: Bytes| async move {
        let body = String::from_utf8_lossy(&body).to_string();
        let mut response: Response =
            format!("{} {} {}", method, uri.path(), body).into_response();

        if uri.path().ends_with("/login") && body.contains("password=123456") {
            let token = RememberMeToken::new("series-1", "sa", "secret");
            let cookie = format!("remember-me={}; Max-Age=1209600; Path=/", token.cookie_value());
            let headers = response.headers_mut();
            headers.insert("x-login-user", HeaderValue::from_static("sa"));
            headers.insert(header::SET_COOKIE, HeaderValue::from_str(&cookie).unwrap());
        }
        response
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
}

/// Session id from the gateway's `Set-Cookie`, if it set one.
pub fn session_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix("SESSION="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Read the captcha code back out of the served SVG.
pub fn captcha_from_svg(svg: &str) -> String {
    svg.split("</text>")
        .filter_map(|part| part.rsplit('>').next())
        .filter(|ch| ch.chars().count() == 1)
        .collect()
}

/// Handles to the in-memory collaborators behind a running gateway.
pub struct Gateway {
    pub sessions: InMemorySessionStore,
    pub registry: InMemorySessionRegistry,
    pub tokens: InMemoryRememberMeStore,
    pub settings: Arc<SystemSettings>,
    pub keys: RsaKeyPair,
    pub shutdown: Shutdown,
}

/// Start a gateway on `config.listener.bind_address` with user "sa" known.
pub async fn start_gateway(config: GatewayConfig) -> Gateway {
    let sessions = InMemorySessionStore::new();
    let registry = InMemorySessionRegistry::new();
    let tokens = InMemoryRememberMeStore::new();
    let users = InMemoryUserLoader::new();
    users.insert(Principal::new("sa"));
    let settings = Arc::new(SystemSettings::new(config.encryption.enabled));
    let keys = RsaKeyPair::generate(1024).unwrap();

    let services = Services {
        sessions: Arc::new(sessions.clone()),
        registry: Arc::new(registry.clone()),
        remember_me: Arc::new(tokens.clone()),
        users: Arc::new(users),
        settings: settings.clone(),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let server = HttpServer::with_services(config, services, keys.clone()).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    Gateway {
        sessions,
        registry,
        tokens,
        settings,
        keys,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
