use serde::{Deserialize, Deserializer, Serialize};

/// Claims embedded in every session token issued by `/api/login`.
///
/// Claims only ever come out of a successful HS256 signature check; they
/// are rebuilt on every request and never cached server-side.
///
/// The admin gate admits a request only when `is_admin` is `true` **and**
/// `username` is one of the configured admin identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity asserted by the issuer. Optional on the wire so that a
    /// signed token without it, or with a non-string value, is classified
    /// as a wrong identity rather than a malformed token.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_none"
    )]
    pub username: Option<String>,

    /// Serialized as `isAdmin`. Only a literal JSON `true` counts; a
    /// missing field, `"true"`, `1` and friends all decode to `false`.
    #[serde(
        rename = "isAdmin",
        default,
        deserialize_with = "strict_true"
    )]
    pub is_admin: bool,

    /// Issued-at (Unix timestamp, seconds). Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Standard JWT expiry (Unix timestamp, seconds). Enforced by the JWT
    /// library when present; tokens we issue always carry it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl SessionClaims {
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

fn strict_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(matches!(value, serde_json::Value::Bool(true)))
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}
