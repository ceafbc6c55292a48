//! Shared helpers: a recording fake LangGraph upstream and gateway spawning on loopback.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use chatgate::auth::{AuthGate, AuthMode, MockRoster, ModeResolver, RouteScope, SessionCookieProvider};
use chatgate::config::Config;
use chatgate::gateway::{self, GatewayState, UpstreamSettings};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const API_KEY: &str = "test-key";

/// One request as the fake upstream saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path and query, e.g. "/threads/search?b=2&a=1".
    pub uri: String,
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct FakeUpstream {
    pub recorded: Arc<Mutex<Vec<Recorded>>>,
    /// Chunks for `/events`; taken by the first request to that path.
    pub events: Arc<Mutex<Option<mpsc::Receiver<Bytes>>>>,
}

impl FakeUpstream {
    pub fn requests(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests().pop().expect("upstream received no request")
    }

    /// Sender feeding the `/events` stream.
    pub fn event_sender(&self) -> mpsc::Sender<Bytes> {
        let (tx, rx) = mpsc::channel(8);
        *self.events.lock().unwrap() = Some(rx);
        tx
    }
}

async fn upstream_handler(State(fake): State<FakeUpstream>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let header_str = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    };
    fake.recorded.lock().unwrap().push(Recorded {
        method: parts.method.to_string(),
        uri: parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default(),
        api_key: header_str("x-api-key"),
        content_type: header_str("content-type"),
        body: body.to_vec(),
    });

    match parts.uri.path() {
        "/missing" => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"message":"Resource not found"}"#,
        )
            .into_response(),
        "/bad" => StatusCode::BAD_REQUEST.into_response(),
        "/created" => (StatusCode::CREATED, r#"{"thread_id":"t1"}"#).into_response(),
        "/events" => {
            let rx = fake.events.lock().unwrap().take();
            let Some(rx) = rx else {
                return StatusCode::GONE.into_response();
            };
            let stream = futures_util::stream::unfold(rx, |mut rx| async move {
                rx.recv()
                    .await
                    .map(|chunk| (Ok::<_, std::convert::Infallible>(chunk), rx))
            });
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(stream),
            )
                .into_response()
        }
        _ => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json"),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "https://upstream.example"),
                (header::HeaderName::from_static("x-upstream"), "1"),
            ],
            r#"{"ok":true}"#,
        )
            .into_response(),
    }
}

pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

pub async fn spawn_upstream() -> (FakeUpstream, String) {
    let fake = FakeUpstream::default();
    let app = Router::new()
        .fallback(upstream_handler)
        .with_state(fake.clone());
    let addr = serve(app).await;
    (fake, format!("http://{}", addr))
}

pub fn gateway_state(base_url: &str, api_key: Option<&str>, mode: AuthMode) -> GatewayState {
    gateway_state_with(Config::default(), MockRoster::preview(), base_url, api_key, mode)
}

pub fn gateway_state_with(
    config: Config,
    roster: MockRoster,
    base_url: &str,
    api_key: Option<&str>,
    mode: AuthMode,
) -> GatewayState {
    let upstream = UpstreamSettings {
        base_url: base_url.to_string(),
        api_key: api_key.map(|k| k.to_string()),
        default_assistant_id: "agent".to_string(),
    };
    let auth = AuthGate::new(
        ModeResolver::Fixed(mode),
        roster,
        Arc::new(SessionCookieProvider::new("appSession", "/auth/login")),
        RouteScope::new(&config.auth.matcher, &config.auth.exclude),
    );
    GatewayState::new(config, upstream, auth).expect("gateway state")
}

/// Start a gateway in front of `base_url`; returns its `http://addr` root.
pub async fn spawn_gateway(base_url: &str, api_key: Option<&str>, mode: AuthMode) -> String {
    let addr = serve(gateway::router(gateway_state(base_url, api_key, mode))).await;
    format!("http://{}", addr)
}

/// Like `spawn_gateway`, with a custom config and mock roster.
pub async fn spawn_gateway_with(
    config: Config,
    roster: MockRoster,
    base_url: &str,
    api_key: Option<&str>,
    mode: AuthMode,
) -> String {
    let state = gateway_state_with(config, roster, base_url, api_key, mode);
    let addr = serve(gateway::router(state)).await;
    format!("http://{}", addr)
}

/// Client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client")
}

/// Cookie header value signing in as the first preview roster user.
pub const ADA_COOKIE: &str = "mockEmail=ada@example.com";
