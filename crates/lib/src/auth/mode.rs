//! Auth mode selection, resolved on every request.

use serde::Serialize;

use crate::config::{AuthModeSetting, ENV_MOCK_AUTH};

/// Which gate logic applies to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Mock,
    Provider,
}

/// Source of the auth mode. `Env` re-reads the variable each call so the flag can change
/// between requests; nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeResolver {
    Fixed(AuthMode),
    Env { var: String },
}

impl ModeResolver {
    pub fn from_setting(setting: AuthModeSetting) -> Self {
        match setting {
            AuthModeSetting::Mock => Self::Fixed(AuthMode::Mock),
            AuthModeSetting::Provider => Self::Fixed(AuthMode::Provider),
            AuthModeSetting::Env => Self::Env {
                var: ENV_MOCK_AUTH.to_string(),
            },
        }
    }

    pub fn resolve(&self) -> AuthMode {
        match self {
            Self::Fixed(mode) => *mode,
            Self::Env { var } => {
                if parse_mock_flag(std::env::var(var).ok().as_deref()) {
                    AuthMode::Mock
                } else {
                    AuthMode::Provider
                }
            }
        }
    }
}

/// True for "true", "1" or "yes" (case-insensitive, trimmed).
pub fn parse_mock_flag(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) => v == "true" || v == "1" || v == "yes",
        None => false,
    }
}
