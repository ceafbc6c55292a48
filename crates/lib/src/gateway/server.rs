//! Gateway HTTP server: shared state, routes, and graceful shutdown.

use crate::auth::{self, mock_login, AuthGate, Identity};
use crate::config::{self, Config};
use anyhow::{Context, Result};
use axum::{
    extract::{FromRef, State},
    http::HeaderMap,
    middleware,
    routing::{get, MethodRouter},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use super::proxy::proxy;

/// Upstream LangGraph settings, resolved once at startup from config and env.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub base_url: String,
    /// None makes every proxied call fail with 401.
    pub api_key: Option<String>,
    pub default_assistant_id: String,
}

impl UpstreamSettings {
    pub fn resolve(config: &Config) -> Self {
        Self {
            base_url: config::resolve_upstream_base_url(config),
            api_key: config::resolve_api_key(config),
            default_assistant_id: config::resolve_default_assistant_id(config),
        }
    }
}

/// Shared state for the gateway (config, upstream client, auth gate).
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub upstream: Arc<UpstreamSettings>,
    /// Upstream client; redirects are relayed to the caller, not followed.
    pub client: reqwest::Client,
    pub auth: AuthGate,
}

impl FromRef<GatewayState> for AuthGate {
    fn from_ref(state: &GatewayState) -> Self {
        state.auth.clone()
    }
}

impl GatewayState {
    pub fn new(config: Config, upstream: UpstreamSettings, auth: AuthGate) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("building upstream http client")?;
        Ok(Self {
            config: Arc::new(config),
            upstream: Arc::new(upstream),
            client,
            auth,
        })
    }

    /// State with upstream settings and auth gate derived from `config` (and env).
    pub fn from_config(config: Config) -> Result<Self> {
        let upstream = UpstreamSettings::resolve(&config);
        let auth = AuthGate::from_config(&config.auth);
        Self::new(config, upstream, auth)
    }
}

/// All routes, behind the auth gate.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(session_info))
        .route("/health", get(health_http))
        .route(
            auth::MOCK_LOGIN_PATH,
            get(mock_login::mock_login_page).post(mock_login::mock_login_submit),
        )
        .route("/mock-logout", get(mock_login::mock_logout))
        .route("/api", proxy_methods())
        .route("/api/", proxy_methods())
        .route("/api/*path", proxy_methods())
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth::auth_gate,
        ))
        .with_state(state)
}

/// The six proxied verbs. `get` also answers HEAD; `forward` rejects it.
fn proxy_methods() -> MethodRouter<GatewayState> {
    get(proxy)
        .post(proxy)
        .put(proxy)
        .patch(proxy)
        .delete(proxy)
        .options(proxy)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let state = GatewayState::from_config(config)?;

    log::info!("upstream: {}", state.upstream.base_url);
    if state.upstream.api_key.is_none() {
        log::warn!(
            "no upstream API key configured (set upstream.apiKey or {}); /api requests will fail with 401",
            config::ENV_API_KEY
        );
    }
    log::info!("auth mode at startup: {:?}", state.auth.mode());

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET /health returns a simple health JSON for liveness checks.
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}

/// GET / reports the identity the gate attached, if any.
async fn session_info(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let user = Identity::from_auth_header(&headers);
    let verified_user_id = user
        .as_ref()
        .and_then(|u| u.verified_user_id())
        .map(|s| s.to_string());
    Json(json!({
        "mode": state.auth.mode(),
        "user": user,
        "verifiedUserId": verified_user_id,
    }))
}
