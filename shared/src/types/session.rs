use serde::{Deserialize, Serialize};

/// Body of `GET /api/auth/status`.
///
/// Lets client code decide what to render without triggering a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub is_authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl AuthStatus {
    pub fn anonymous() -> Self {
        Self {
            is_authenticated: false,
            is_admin: None,
            username: None,
        }
    }

    pub fn authenticated(username: Option<String>, is_admin: bool) -> Self {
        Self {
            is_authenticated: true,
            is_admin: Some(is_admin),
            username,
        }
    }
}

/// Body of `GET /api/auth/verify-admin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminVerification {
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AdminVerification {
    pub fn granted(username: Option<String>) -> Self {
        Self {
            is_admin: true,
            username,
            error: None,
        }
    }

    pub fn denied(username: Option<String>, error: &str) -> Self {
        Self {
            is_admin: false,
            username,
            error: Some(error.to_string()),
        }
    }
}
