//! Identity shapes: mock roster entries and the request-scoped identity derived from them.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

/// Request header carrying the JSON-serialized matched roster entry.
pub const AUTH_USER_HEADER: &str = "x-auth-user";

/// One entry of the mock roster. Serialized as `{name, email, emailVerified, picture?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// The caller's identity for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub email_verified: bool,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl Identity {
    /// The email, but only when it has been verified.
    pub fn verified_user_id(&self) -> Option<&str> {
        if self.email_verified {
            Some(&self.email)
        } else {
            None
        }
    }

    /// Read the identity the gate attached as `x-auth-user`. None when absent or malformed.
    pub fn from_auth_header(headers: &HeaderMap) -> Option<Self> {
        let raw = headers.get(AUTH_USER_HEADER)?;
        let user: MockUser = serde_json::from_slice(raw.as_bytes()).ok()?;
        Some(Self::from(&user))
    }
}

impl From<&MockUser> for Identity {
    fn from(user: &MockUser) -> Self {
        Self {
            email: user.email.clone(),
            email_verified: user.email_verified,
            name: user.name.clone(),
            picture: user.picture.clone(),
        }
    }
}

/// Fixed, ordered list of mock users. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct MockRoster {
    users: Vec<MockUser>,
}

impl MockRoster {
    pub fn new(users: Vec<MockUser>) -> Self {
        Self { users }
    }

    /// Roster used for preview deployments when the config names none.
    pub fn preview() -> Self {
        Self::new(vec![
            MockUser {
                name: "Ada Preview".to_string(),
                email: "ada@example.com".to_string(),
                email_verified: true,
                picture: Some("https://www.gravatar.com/avatar/?d=identicon".to_string()),
            },
            MockUser {
                name: "Grace Preview".to_string(),
                email: "grace@example.com".to_string(),
                email_verified: true,
                picture: None,
            },
            MockUser {
                name: "Unverified Preview".to_string(),
                email: "unverified@example.com".to_string(),
                email_verified: false,
                picture: None,
            },
        ])
    }

    /// Exact-match lookup by email.
    pub fn find(&self, email: &str) -> Option<&MockUser> {
        self.users.iter().find(|u| u.email == email)
    }

    pub fn users(&self) -> &[MockUser] {
        &self.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn mock_user_serializes_camel_case_without_missing_picture() {
        let roster = MockRoster::preview();
        let grace = roster.find("grace@example.com").unwrap();
        let json = serde_json::to_string(grace).unwrap();
        assert_eq!(
            json,
            r#"{"name":"Grace Preview","email":"grace@example.com","emailVerified":true}"#
        );
    }

    #[test]
    fn find_is_exact() {
        let roster = MockRoster::preview();
        assert!(roster.find("ada@example.com").is_some());
        assert!(roster.find("ADA@example.com").is_none());
        assert!(roster.find(" ada@example.com").is_none());
        assert!(roster.find("").is_none());
    }

    #[test]
    fn verified_user_id_requires_verification() {
        let roster = MockRoster::preview();
        let ada = Identity::from(roster.find("ada@example.com").unwrap());
        assert_eq!(ada.verified_user_id(), Some("ada@example.com"));
        let unverified = Identity::from(roster.find("unverified@example.com").unwrap());
        assert_eq!(unverified.verified_user_id(), None);
    }

    #[test]
    fn identity_from_auth_header() {
        let mut headers = HeaderMap::new();
        assert!(Identity::from_auth_header(&headers).is_none());

        headers.insert(
            AUTH_USER_HEADER,
            HeaderValue::from_static(r#"{"name":"Q","email":"q@example.com","emailVerified":true}"#),
        );
        let identity = Identity::from_auth_header(&headers).unwrap();
        assert_eq!(identity.email, "q@example.com");
        assert!(identity.email_verified);

        headers.insert(AUTH_USER_HEADER, HeaderValue::from_static("not json"));
        assert!(Identity::from_auth_header(&headers).is_none());
    }
}
