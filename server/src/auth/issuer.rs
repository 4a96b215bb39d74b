use std::fmt;

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use shared::types::SessionClaims;

/// Signs session tokens for `/api/login`.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    expiry_secs: u64,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("expiry_secs", &self.expiry_secs)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, expiry_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            expiry_secs,
        }
    }

    pub fn expiry_secs(&self) -> u64 {
        self.expiry_secs
    }

    /// Claims stamped with the current time and a `ttl_secs` lifetime.
    pub fn claims_for(username: Option<&str>, is_admin: bool, ttl_secs: i64) -> SessionClaims {
        let now = Utc::now().timestamp();
        SessionClaims {
            username: username.map(str::to_string),
            is_admin,
            iat: Some(now),
            exp: Some(now + ttl_secs),
        }
    }

    /// HS256-sign arbitrary claims.
    pub fn sign(&self, claims: &SessionClaims) -> Result<String> {
        jsonwebtoken::encode(&Header::default(), claims, &self.encoding_key)
            .context("Failed to sign session token")
    }

    /// Issue an admin session for a username that already passed the
    /// credential check.
    pub fn issue_admin(&self, username: &str) -> Result<(String, SessionClaims)> {
        let ttl = i64::try_from(self.expiry_secs).context("token expiry out of range")?;
        let claims = Self::claims_for(Some(username), true, ttl);
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }
}
