//! Edge auth gate: decides per request whether a request may proceed, and as whom.
//!
//! Two modes: `provider` delegates to the OAuth provider's session check; `mock` looks up
//! the `mockEmail` cookie in a fixed roster and forwards the match as `x-auth-user`.

mod cookie;
mod gate;
mod identity;
pub mod mock_login;
mod mode;
mod provider;
mod scope;

pub use cookie::read_cookie;
pub use gate::{auth_gate, classify_mock_request, AuthGate, MockGateState};
pub use identity::{Identity, MockRoster, MockUser, AUTH_USER_HEADER};
pub use mode::{parse_mock_flag, AuthMode, ModeResolver};
pub use provider::{AuthProvider, SessionCookieProvider};
pub use scope::RouteScope;

/// Cookie carrying the selected mock identity's email.
pub const MOCK_EMAIL_COOKIE: &str = "mockEmail";

/// Where unauthenticated mock-mode requests are redirected.
pub const MOCK_LOGIN_PATH: &str = "/mock-login";
