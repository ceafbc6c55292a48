//! `/api/*` reverse proxy to the LangGraph service.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;

use super::cors::{cors_headers, merge_headers};
use super::error::GatewayError;
use super::server::GatewayState;

const API_PREFIX: &str = "/api";
const DEFAULT_UPSTREAM_ERROR: &str = "API request failed";
const API_KEY_HEADER: &str = "x-api-key";

/// Connection-scoped headers that must not be relayed.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Path below the `/api` mount, without leading slash.
fn target_path(uri_path: &str) -> &str {
    uri_path
        .strip_prefix(API_PREFIX)
        .unwrap_or(uri_path)
        .trim_start_matches('/')
}

/// Upstream URL for a target path; the raw query is appended verbatim when non-empty.
pub fn upstream_url(base_url: &str, path: &str, query: Option<&str>) -> String {
    let mut url = format!("{}/{}", base_url.trim_end_matches('/'), path);
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(q);
    }
    url
}

/// Stream run creation: `runs/stream` or `threads/<id>/runs/stream`.
pub fn is_stream_run_path(path: &str) -> bool {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    matches!(
        segments.as_slice(),
        ["runs", "stream"] | ["threads", _, "runs", "stream"]
    )
}

pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Body with `assistant_id` set to `default_id` when the JSON object lacks one.
/// Bodies that already carry it, or are not objects, come back unchanged.
pub fn ensure_assistant_id(body: &[u8], default_id: &str) -> Result<Vec<u8>, GatewayError> {
    let mut value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| GatewayError::InvalidRequestBody)?;
    match value.as_object_mut() {
        Some(obj) if !obj.contains_key("assistant_id") => {
            obj.insert(
                "assistant_id".to_string(),
                serde_json::Value::String(default_id.to_string()),
            );
            serde_json::to_vec(&value).map_err(|_| GatewayError::InvalidRequestBody)
        }
        _ => Ok(body.to_vec()),
    }
}

/// `message` from an upstream JSON error body, or the generic fallback.
pub fn upstream_error_message(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| DEFAULT_UPSTREAM_ERROR.to_string())
}

fn without_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut out = headers.clone();
    for name in HOP_BY_HOP {
        out.remove(name);
    }
    out
}

fn preflight() -> Response {
    (StatusCode::NO_CONTENT, cors_headers()).into_response()
}

/// Handler for the proxied verbs on `/api`, `/api/` and `/api/*`.
pub async fn proxy(State(state): State<GatewayState>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    match forward(&state, request).await {
        Ok(response) => response,
        Err(e) => {
            match &e {
                GatewayError::Network(err) => {
                    log::error!("proxy {} {}: upstream call failed: {}", method, path, err)
                }
                GatewayError::Upstream { status, message } => {
                    log::warn!("proxy {} {}: upstream {}: {}", method, path, status, message)
                }
                other => log::debug!("proxy {} {}: {}", method, path, other),
            }
            e.into_response()
        }
    }
}

fn is_proxied_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Rejects a declared `Content-Length` above `limit` before any body is read.
fn check_content_length(headers: &HeaderMap, limit: usize) -> Result<(), GatewayError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    match declared {
        Some(len) if len > limit as u64 => Err(GatewayError::BodyTooLarge { limit }),
        _ => Ok(()),
    }
}

fn body_read_error(err: axum::Error, limit: usize) -> GatewayError {
    let over_limit = std::error::Error::source(&err)
        .map(|source| source.is::<LengthLimitError>())
        .unwrap_or(false);
    if over_limit {
        GatewayError::BodyTooLarge { limit }
    } else {
        GatewayError::RequestBody(err.to_string())
    }
}

async fn forward(state: &GatewayState, request: Request) -> Result<Response, GatewayError> {
    if request.method() == Method::OPTIONS {
        return Ok(preflight());
    }
    if !is_proxied_method(request.method()) {
        return Err(GatewayError::MethodNotAllowed(request.method().to_string()));
    }
    let api_key = state
        .upstream
        .api_key
        .as_deref()
        .ok_or(GatewayError::MissingApiKey)?;

    let (parts, body) = request.into_parts();
    let path = target_path(parts.uri.path());
    let url = upstream_url(&state.upstream.base_url, path, parts.uri.query());
    let limit = state.config.gateway.max_body_bytes;
    check_content_length(&parts.headers, limit)?;
    let body = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| body_read_error(e, limit))?;

    let body: Vec<u8> = if is_stream_run_path(path) && is_json_content_type(&parts.headers) {
        ensure_assistant_id(&body, &state.upstream.default_assistant_id)?
    } else {
        body.to_vec()
    };

    log::debug!("proxy {} /{} -> {}", parts.method, path, url);
    let mut outbound = state
        .client
        .request(parts.method.clone(), &url)
        .header(HeaderName::from_static(API_KEY_HEADER), api_key);
    if !body.is_empty() {
        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));
        outbound = outbound.header(header::CONTENT_TYPE, content_type).body(body);
    }

    // Dropping this future (client gone) drops the upstream request with it.
    let upstream = outbound.send().await?;
    let status = upstream.status();
    if !status.is_success() {
        let raw = upstream.bytes().await.unwrap_or_default();
        return Err(GatewayError::Upstream {
            status,
            message: upstream_error_message(&raw),
        });
    }

    let headers = merge_headers(&without_hop_by_hop(upstream.headers()), &cors_headers());
    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
