use http::Request;
use shared::types::{GateConfig, SessionClaims};

use super::verifier::{AccessDenial, SessionVerifier};
use crate::handlers::http::utils::get_cookie;

/// What the gate does with one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Continue to the handler. Carries the verified claims when the path
    /// was protected, `None` when the gate did not look at it.
    Admit(Option<SessionClaims>),
    RedirectToLogin(AccessDenial),
    RedirectToUnauthorized(AccessDenial),
}

impl GateDecision {
    pub fn is_admit(&self) -> bool {
        matches!(self, GateDecision::Admit(_))
    }
}

/// Per-request admission check for everything under the protected prefix.
///
/// Pure apart from the JWT library's clock: same path and cookie in, same
/// decision out.
#[derive(Debug, Clone)]
pub struct AccessGate {
    verifier: SessionVerifier,
    config: GateConfig,
}

impl AccessGate {
    pub fn new(verifier: SessionVerifier, config: GateConfig) -> Self {
        Self { verifier, config }
    }

    pub fn verifier(&self) -> &SessionVerifier {
        &self.verifier
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Plain prefix test, so `/admin`, `/admin/x` and `/administrator` are
    /// all protected.
    pub fn is_protected(&self, path: &str) -> bool {
        path.starts_with(self.config.protected_prefix.as_str())
    }

    /// Decision list, first match wins:
    /// unprotected → admit; no token / bad token → login;
    /// not admin / wrong identity → unauthorized; otherwise admit.
    pub fn decide(&self, path: &str, token: Option<&str>) -> GateDecision {
        if !self.is_protected(path) {
            return GateDecision::Admit(None);
        }

        match self.verifier.check(token) {
            Ok(claims) => GateDecision::Admit(Some(claims)),
            Err(denial @ (AccessDenial::MissingToken | AccessDenial::InvalidSignature(_))) => {
                GateDecision::RedirectToLogin(denial)
            }
            Err(
                denial @ (AccessDenial::InsufficientPrivilege { .. }
                | AccessDenial::IdentityMismatch { .. }),
            ) => GateDecision::RedirectToUnauthorized(denial),
        }
    }

    /// [`decide`](Self::decide) with the path and cookie taken from a request.
    pub fn decide_request<B>(&self, req: &Request<B>) -> GateDecision {
        let path = req.uri().path();
        if !self.is_protected(path) {
            return GateDecision::Admit(None);
        }
        let token = get_cookie(req.headers(), &self.config.cookie_name);
        self.decide(path, token.as_deref())
    }

    /// Location header value for a redirect decision.
    pub fn redirect_target(&self, decision: &GateDecision) -> Option<&str> {
        match decision {
            GateDecision::Admit(_) => None,
            GateDecision::RedirectToLogin(_) => Some(&self.config.login_path),
            GateDecision::RedirectToUnauthorized(_) => Some(&self.config.unauthorized_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::AuthorizedAdmins;
    use crate::auth::issuer::TokenIssuer;
    use std::sync::Arc;

    const SECRET: &str = "gate-secret-gate-secret-gate-secret!";

    fn gate() -> AccessGate {
        let verifier =
            SessionVerifier::new(SECRET, Arc::new(AuthorizedAdmins::single("shakibkumnale")));
        AccessGate::new(verifier, GateConfig::default())
    }

    fn signed(secret: &str, username: &str, is_admin: bool, ttl: i64) -> String {
        TokenIssuer::new(secret, 0)
            .sign(&TokenIssuer::claims_for(Some(username), is_admin, ttl))
            .unwrap()
    }

    #[test]
    fn unprotected_path_is_never_checked() {
        let g = gate();
        assert_eq!(g.decide("/", None), GateDecision::Admit(None));
        assert_eq!(g.decide("/api/artists", Some("junk")), GateDecision::Admit(None));
    }

    #[test]
    fn prefix_match_is_textual() {
        let g = gate();
        assert!(g.is_protected("/admin"));
        assert!(g.is_protected("/admin/artists"));
        assert!(g.is_protected("/administrator"));
        assert!(!g.is_protected("/api/admin"));
    }

    #[test]
    fn missing_cookie_redirects_to_login() {
        let g = gate();
        let d = g.decide("/admin/artists", None);
        assert_eq!(d, GateDecision::RedirectToLogin(AccessDenial::MissingToken));
        assert_eq!(g.redirect_target(&d), Some("/login"));
    }

    #[test]
    fn expired_token_redirects_to_login() {
        let token = signed(SECRET, "shakibkumnale", true, -3600);
        assert!(matches!(
            gate().decide("/admin", Some(&token)),
            GateDecision::RedirectToLogin(AccessDenial::InvalidSignature(_))
        ));
    }

    #[test]
    fn foreign_secret_redirects_to_login() {
        let token = signed("another-secret-another-secret-xxxx", "shakibkumnale", true, 3600);
        assert!(matches!(
            gate().decide("/admin", Some(&token)),
            GateDecision::RedirectToLogin(_)
        ));
    }

    #[test]
    fn non_admin_redirects_to_unauthorized() {
        let g = gate();
        let d = g.decide("/admin", Some(&signed(SECRET, "shakibkumnale", false, 3600)));
        assert!(matches!(d, GateDecision::RedirectToUnauthorized(_)));
        assert_eq!(g.redirect_target(&d), Some("/unauthorized"));
    }

    #[test]
    fn other_admin_identity_redirects_to_unauthorized() {
        let d = gate().decide("/admin", Some(&signed(SECRET, "someoneelse", true, 3600)));
        assert!(matches!(
            d,
            GateDecision::RedirectToUnauthorized(AccessDenial::IdentityMismatch { .. })
        ));
    }

    #[test]
    fn configured_admin_is_admitted_with_claims() {
        let d = gate().decide("/admin", Some(&signed(SECRET, "shakibkumnale", true, 3600)));
        match d {
            GateDecision::Admit(Some(claims)) => {
                assert_eq!(claims.username(), Some("shakibkumnale"))
            }
            other => panic!("expected admit, got {:?}", other),
        }
    }

    #[test]
    fn decide_request_reads_the_named_cookie() {
        let token = signed(SECRET, "shakibkumnale", true, 3600);
        let req = Request::builder()
            .uri("/admin/artists?page=2")
            .header("cookie", format!("theme=dark; token={}", token))
            .body(())
            .unwrap();
        assert!(gate().decide_request(&req).is_admit());

        let other_cookie = Request::builder()
            .uri("/admin")
            .header("cookie", format!("session={}", token))
            .body(())
            .unwrap();
        assert!(matches!(
            gate().decide_request(&other_cookie),
            GateDecision::RedirectToLogin(AccessDenial::MissingToken)
        ));
    }
}
