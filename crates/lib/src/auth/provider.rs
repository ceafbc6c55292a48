//! OAuth provider delegation.
//!
//! In provider mode the gate hands the whole request to an [`AuthProvider`] and returns its
//! response untouched. The provider's session format is never interpreted here.

use async_trait::async_trait;
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::cookie::read_cookie;
use crate::config::ProviderConfig;

/// External session check. Returns either the downstream response (via `next`) or a redirect.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn handle(&self, request: Request, next: Next) -> Response;
}

/// Passes requests carrying the provider's session cookie; sends everything else to the
/// provider's login route with a `returnTo` parameter.
#[derive(Debug, Clone)]
pub struct SessionCookieProvider {
    session_cookie: String,
    login_url: String,
}

impl SessionCookieProvider {
    pub fn new(session_cookie: impl Into<String>, login_url: impl Into<String>) -> Self {
        Self {
            session_cookie: session_cookie.into(),
            login_url: login_url.into(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.session_cookie.clone(), config.login_url.clone())
    }

    /// Login URL carrying the original path and query as `returnTo`.
    pub fn login_redirect_target(&self, path_and_query: &str) -> String {
        let sep = if self.login_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}returnTo={}",
            self.login_url,
            sep,
            urlencoding::encode(path_and_query)
        )
    }
}

#[async_trait]
impl AuthProvider for SessionCookieProvider {
    async fn handle(&self, request: Request, next: Next) -> Response {
        if read_cookie(request.headers(), &self.session_cookie).is_some() {
            return next.run(request).await;
        }
        let original = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let target = self.login_redirect_target(original);
        log::debug!("provider session missing, redirecting to {}", target);
        Redirect::temporary(&target).into_response()
    }
}
