//! Gateway failures and their JSON `{error}` responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::cors::cors_headers;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No upstream API key configured.
    #[error("API key not configured")]
    MissingApiKey,
    /// Stream run body declared as JSON but did not parse.
    #[error("Invalid JSON in request body")]
    InvalidRequestBody,
    /// Inbound body could not be read.
    #[error("failed to read request body: {0}")]
    RequestBody(String),
    /// Inbound body exceeds `gateway.maxBodyBytes`.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
    /// Verb outside GET, POST, PUT, PATCH, DELETE, OPTIONS.
    #[error("method {0} not allowed")]
    MethodNotAllowed(String),
    /// Upstream answered with a non-success status.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },
    /// The upstream call itself failed.
    #[error("{0}")]
    Network(#[from] reqwest::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingApiKey => StatusCode::UNAUTHORIZED,
            Self::InvalidRequestBody | Self::RequestBody(_) => StatusCode::BAD_REQUEST,
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Upstream { status, .. } => *status,
            Self::Network(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (
            self.status(),
            cors_headers(),
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
