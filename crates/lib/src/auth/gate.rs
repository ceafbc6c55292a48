//! Gate middleware: scope check, mode switch, and the mock-mode cookie state machine.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use super::identity::{MockRoster, MockUser, AUTH_USER_HEADER};
use super::mode::{AuthMode, ModeResolver};
use super::provider::{AuthProvider, SessionCookieProvider};
use super::scope::RouteScope;
use super::{read_cookie, MOCK_EMAIL_COOKIE, MOCK_LOGIN_PATH};
use crate::config::AuthConfig;

/// Gate state shared by the middleware and the mock login pages.
#[derive(Clone)]
pub struct AuthGate {
    mode: ModeResolver,
    roster: Arc<MockRoster>,
    provider: Arc<dyn AuthProvider>,
    scope: Arc<RouteScope>,
}

impl AuthGate {
    pub fn new(
        mode: ModeResolver,
        roster: MockRoster,
        provider: Arc<dyn AuthProvider>,
        scope: RouteScope,
    ) -> Self {
        Self {
            mode,
            roster: Arc::new(roster),
            provider,
            scope: Arc::new(scope),
        }
    }

    pub fn from_config(auth: &AuthConfig) -> Self {
        let roster = match &auth.mock_users {
            Some(users) => MockRoster::new(users.clone()),
            None => MockRoster::preview(),
        };
        Self::new(
            ModeResolver::from_setting(auth.mode),
            roster,
            Arc::new(SessionCookieProvider::from_config(&auth.provider)),
            RouteScope::new(&auth.matcher, &auth.exclude),
        )
    }

    /// Current mode; re-resolved on each call.
    pub fn mode(&self) -> AuthMode {
        self.mode.resolve()
    }

    pub fn roster(&self) -> &MockRoster {
        &self.roster
    }
}

/// Mock-mode classification of a request, recomputed from the cookie every time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockGateState<'a> {
    NoCookie,
    UnknownEmail(String),
    KnownEmail(&'a MockUser),
}

pub fn classify_mock_request<'a>(cookie: Option<&str>, roster: &'a MockRoster) -> MockGateState<'a> {
    match cookie {
        None => MockGateState::NoCookie,
        Some(email) => match roster.find(email) {
            Some(user) => MockGateState::KnownEmail(user),
            None => MockGateState::UnknownEmail(email.to_string()),
        },
    }
}

/// Middleware run before every route. Out-of-scope paths and CORS preflights pass through
/// without an identity.
pub async fn auth_gate(State(gate): State<AuthGate>, mut request: Request, next: Next) -> Response {
    // Only the gate may set the identity header.
    request.headers_mut().remove(AUTH_USER_HEADER);
    if request.method() == Method::OPTIONS || !gate.scope.applies_to(request.uri().path()) {
        return next.run(request).await;
    }
    match gate.mode() {
        AuthMode::Provider => gate.provider.handle(request, next).await,
        AuthMode::Mock => mock_gate(&gate, request, next).await,
    }
}

async fn mock_gate(gate: &AuthGate, mut request: Request, next: Next) -> Response {
    let cookie = read_cookie(request.headers(), MOCK_EMAIL_COOKIE);
    let user = match classify_mock_request(cookie.as_deref(), gate.roster()) {
        MockGateState::NoCookie => {
            log::debug!("mock auth: no {} cookie for {}", MOCK_EMAIL_COOKIE, request.uri().path());
            return Redirect::temporary(MOCK_LOGIN_PATH).into_response();
        }
        MockGateState::UnknownEmail(email) => {
            log::debug!("mock auth: {} is not in the roster", email);
            return Redirect::temporary(MOCK_LOGIN_PATH).into_response();
        }
        MockGateState::KnownEmail(user) => user,
    };

    let header_value = serde_json::to_vec(user)
        .ok()
        .and_then(|json| HeaderValue::from_bytes(&json).ok());
    let Some(header_value) = header_value else {
        log::warn!("mock auth: could not encode {} as a header", user.email);
        return Redirect::temporary(MOCK_LOGIN_PATH).into_response();
    };

    request
        .headers_mut()
        .insert(AUTH_USER_HEADER, header_value.clone());
    let mut response = next.run(request).await;
    response.headers_mut().insert(AUTH_USER_HEADER, header_value);
    response
}
