//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.chatgate/config.json`) and environment.
//! Environment variables override the file for the upstream settings; the auth mode
//! flag is read per request (see [`crate::auth::ModeResolver`]).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::auth::MockUser;

/// Env var holding the upstream LangGraph base URL.
pub const ENV_API_URL: &str = "LANGGRAPH_API_URL";
/// Env var holding the upstream API key.
pub const ENV_API_KEY: &str = "LANGSMITH_API_KEY";
/// Env var holding the default assistant id injected into stream runs.
pub const ENV_ASSISTANT_ID: &str = "LANGGRAPH_ASSISTANT_ID";
/// Env var enabling mock auth when `auth.mode` is `env`.
pub const ENV_MOCK_AUTH: &str = "USE_MOCK_AUTH";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Upstream LangGraph service settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Auth gate settings (mode, mock roster, provider, route scope).
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Gateway bind, port, and request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 3000).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,

    /// Largest inbound request body the proxy will read (default 10 MiB).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Upstream LangGraph service. Each field is overridden by its env var when set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamConfig {
    /// Base URL, e.g. "http://localhost:2024". Overridden by LANGGRAPH_API_URL.
    pub base_url: Option<String>,
    /// API key sent as `x-api-key`. Overridden by LANGSMITH_API_KEY.
    pub api_key: Option<String>,
    /// Assistant id injected into stream runs that omit one. Overridden by LANGGRAPH_ASSISTANT_ID.
    pub default_assistant_id: Option<String>,
}

const DEFAULT_UPSTREAM_BASE_URL: &str = "http://localhost:2024";
const DEFAULT_ASSISTANT_ID: &str = "agent";

/// How the auth mode is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthModeSetting {
    /// Read USE_MOCK_AUTH on every request.
    #[default]
    Env,
    /// Always use the mock roster.
    Mock,
    /// Always delegate to the OAuth provider.
    Provider,
}

/// Auth gate config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthModeSetting,

    /// Mock roster. When absent, the built-in preview roster is used.
    #[serde(default)]
    pub mock_users: Option<Vec<MockUser>>,

    #[serde(default)]
    pub provider: ProviderConfig,

    /// Path patterns the gate applies to (`/` exact, `/prefix/*` subtree).
    #[serde(default = "default_matcher")]
    pub matcher: Vec<String>,

    /// Path patterns that always bypass the gate; checked before `matcher`.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_matcher() -> Vec<String> {
    ["/", "/api/*", "/protected/*"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_exclude() -> Vec<String> {
    [
        "/auth/*",
        "/mock-login",
        "/mock-logout",
        "/health",
        "/_next/static/*",
        "/_next/image/*",
        "/favicon.ico",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthModeSetting::default(),
            mock_users: None,
            provider: ProviderConfig::default(),
            matcher: default_matcher(),
            exclude: default_exclude(),
        }
    }
}

/// OAuth provider session check. The session cookie is only tested for presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Name of the provider's session cookie (default "appSession").
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// Where unauthenticated requests are sent (default "/auth/login").
    #[serde(default = "default_login_url")]
    pub login_url: String,
}

fn default_session_cookie() -> String {
    "appSession".to_string()
}

fn default_login_url() -> String {
    "/auth/login".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            session_cookie: default_session_cookie(),
            login_url: default_login_url(),
        }
    }
}

/// Non-empty trimmed value of an env var.
fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn config_nonempty(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the upstream base URL: env LANGGRAPH_API_URL overrides config. Trailing slashes removed.
pub fn resolve_upstream_base_url(config: &Config) -> String {
    env_nonempty(ENV_API_URL)
        .or_else(|| config_nonempty(&config.upstream.base_url))
        .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Resolve the upstream API key: env LANGSMITH_API_KEY overrides config. None when unset.
pub fn resolve_api_key(config: &Config) -> Option<String> {
    env_nonempty(ENV_API_KEY).or_else(|| config_nonempty(&config.upstream.api_key))
}

/// Resolve the default assistant id: env LANGGRAPH_ASSISTANT_ID overrides config.
pub fn resolve_default_assistant_id(config: &Config) -> String {
    env_nonempty(ENV_ASSISTANT_ID)
        .or_else(|| config_nonempty(&config.upstream.default_assistant_id))
        .unwrap_or_else(|| DEFAULT_ASSISTANT_ID.to_string())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("CHATGATE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".chatgate").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or CHATGATE_CONFIG_PATH).
/// Missing file => default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
