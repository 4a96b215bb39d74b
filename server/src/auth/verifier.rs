use std::fmt;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use shared::types::SessionClaims;
use thiserror::Error;
use tracing::debug;

use super::identity::IdentityPolicy;

/// Why a session token did not grant admin access.
///
/// Every variant is resolved locally by its consumer (gate redirect, status
/// JSON, verify-admin JSON) and never escapes as a server error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessDenial {
    #[error("no session token")]
    MissingToken,

    /// Malformed, wrongly signed or expired. The string is the library's
    /// reason and is only ever logged.
    #[error("invalid session token: {0}")]
    InvalidSignature(String),

    #[error("session for {} lacks admin privilege", display_user(.claims))]
    InsufficientPrivilege { claims: SessionClaims },

    #[error("{} is not an authorized admin identity", display_user(.claims))]
    IdentityMismatch { claims: SessionClaims },
}

fn display_user(claims: &SessionClaims) -> &str {
    claims.username().unwrap_or("<no username>")
}

impl AccessDenial {
    /// Claims that verified but were refused, if any.
    pub fn claims(&self) -> Option<&SessionClaims> {
        match self {
            AccessDenial::InsufficientPrivilege { claims }
            | AccessDenial::IdentityMismatch { claims } => Some(claims),
            AccessDenial::MissingToken | AccessDenial::InvalidSignature(_) => None,
        }
    }

    /// `true` when the token itself was genuine and only the privilege
    /// checks failed.
    pub fn is_authenticated(&self) -> bool {
        self.claims().is_some()
    }
}

/// Outcome of the shared access predicate.
pub type AccessCheck = Result<SessionClaims, AccessDenial>;

/// Stateless session-token verifier: HS256 signature + expiry, then the
/// admin flag, then the identity policy.
///
/// The gate, the status query and verify-admin all call [`check`] so they
/// can never disagree about a token.
///
/// [`check`]: SessionVerifier::check
#[derive(Clone)]
pub struct SessionVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    identities: Arc<dyn IdentityPolicy>,
}

impl fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("algorithm", &"HS256")
            .field("identities", &self.identities)
            .finish()
    }
}

impl SessionVerifier {
    pub fn new(secret: &str, identities: Arc<dyn IdentityPolicy>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is still enforced whenever the token carries one.
        validation.required_spec_claims.clear();

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            identities,
        }
    }

    pub fn identities(&self) -> &dyn IdentityPolicy {
        self.identities.as_ref()
    }

    /// Signature and expiry only; no privilege checks.
    pub fn verify_signature(&self, token: &str) -> Result<SessionClaims, AccessDenial> {
        jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AccessDenial::InvalidSignature(e.to_string()))
    }

    /// The full admin predicate.
    ///
    /// An absent or blank token is `MissingToken`; anything the JWT library
    /// rejects is `InvalidSignature`.
    pub fn check(&self, token: Option<&str>) -> AccessCheck {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AccessDenial::MissingToken),
        };

        let claims = self.verify_signature(token)?;

        if !claims.is_admin {
            return Err(AccessDenial::InsufficientPrivilege { claims });
        }

        let authorized = claims
            .username()
            .map(|u| self.identities.is_authorized(u))
            .unwrap_or(false);
        if !authorized {
            return Err(AccessDenial::IdentityMismatch { claims });
        }

        debug!("Session verified for admin {}", display_user(&claims));
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::AuthorizedAdmins;
    use crate::auth::issuer::TokenIssuer;
    use serde_json::json;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes";

    fn verifier() -> SessionVerifier {
        SessionVerifier::new(SECRET, Arc::new(AuthorizedAdmins::single("shakibkumnale")))
    }

    fn token(username: Option<&str>, is_admin: bool) -> String {
        TokenIssuer::new(SECRET, 3600)
            .sign(&TokenIssuer::claims_for(username, is_admin, 3600))
            .unwrap()
    }

    #[test]
    fn admitted_token_returns_claims() {
        let claims = verifier()
            .check(Some(&token(Some("shakibkumnale"), true)))
            .unwrap();
        assert_eq!(claims.username(), Some("shakibkumnale"));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        assert_eq!(verifier().check(Some("  ")), Err(AccessDenial::MissingToken));
        assert_eq!(verifier().check(None), Err(AccessDenial::MissingToken));
    }

    #[test]
    fn garbage_token_is_invalid_signature() {
        assert!(matches!(
            verifier().check(Some("not.a.jwt")),
            Err(AccessDenial::InvalidSignature(_))
        ));
    }

    #[test]
    fn non_admin_is_insufficient_privilege() {
        let denial = verifier()
            .check(Some(&token(Some("shakibkumnale"), false)))
            .unwrap_err();
        assert!(matches!(denial, AccessDenial::InsufficientPrivilege { .. }));
        assert!(denial.is_authenticated());
    }

    #[test]
    fn admin_flag_is_checked_before_identity() {
        let denial = verifier()
            .check(Some(&token(Some("someoneelse"), false)))
            .unwrap_err();
        assert!(matches!(denial, AccessDenial::InsufficientPrivilege { .. }));
    }

    fn raw_token(payload: serde_json::Value) -> String {
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &payload,
            &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn token_without_iat_is_admitted() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let token = raw_token(json!({"username": "shakibkumnale", "isAdmin": true, "exp": exp}));
        let claims = verifier().check(Some(&token)).unwrap();
        assert_eq!(claims.iat, None);
    }

    #[test]
    fn token_without_exp_is_admitted() {
        let token = raw_token(json!({"username": "shakibkumnale", "isAdmin": true}));
        assert!(verifier().check(Some(&token)).is_ok());
    }

    #[test]
    fn expired_raw_token_is_invalid_signature() {
        let exp = chrono::Utc::now().timestamp() - 3600;
        let token = raw_token(json!({"username": "shakibkumnale", "isAdmin": true, "exp": exp}));
        assert!(matches!(
            verifier().check(Some(&token)),
            Err(AccessDenial::InvalidSignature(_))
        ));
    }

    #[test]
    fn non_string_username_is_identity_mismatch() {
        let token = raw_token(json!({"username": 42, "isAdmin": true, "iat": 1}));
        let denial = verifier().check(Some(&token)).unwrap_err();
        assert!(matches!(denial, AccessDenial::IdentityMismatch { .. }));
        assert!(denial.is_authenticated());
    }

    #[test]
    fn missing_username_is_identity_mismatch() {
        let denial = verifier().check(Some(&token(None, true))).unwrap_err();
        assert!(matches!(denial, AccessDenial::IdentityMismatch { .. }));
        assert!(denial.to_string().contains("<no username>"));
    }
}
