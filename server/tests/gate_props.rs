/// Properties of the gate decision that must hold for every input.
use std::sync::Arc;

use proptest::prelude::*;
use server::auth::{AccessDenial, AccessGate, AuthorizedAdmins, GateDecision, SessionVerifier, TokenIssuer};
use shared::types::GateConfig;

const SECRET: &str = "property-secret-property-secret-!!";
const ADMIN: &str = "shakibkumnale";

fn gate() -> AccessGate {
    let verifier = SessionVerifier::new(SECRET, Arc::new(AuthorizedAdmins::single(ADMIN)));
    AccessGate::new(verifier, GateConfig::default())
}

fn sign(secret: &str, username: &str, is_admin: bool) -> String {
    TokenIssuer::new(secret, 3600)
        .sign(&TokenIssuer::claims_for(Some(username), is_admin, 3600))
        .unwrap()
}

fn public_path() -> impl Strategy<Value = String> {
    "/[a-z0-9/._-]{0,24}".prop_filter("must not be under /admin", |p| !p.starts_with("/admin"))
}

fn admin_path() -> impl Strategy<Value = String> {
    "[a-z0-9/._-]{0,24}".prop_map(|rest| format!("/admin{}", rest))
}

proptest! {
    #[test]
    fn public_paths_are_always_admitted(path in public_path(), cookie in proptest::option::of(".{0,40}")) {
        prop_assert_eq!(gate().decide(&path, cookie.as_deref()), GateDecision::Admit(None));
    }

    #[test]
    fn protected_paths_without_token_go_to_login(path in admin_path()) {
        prop_assert_eq!(
            gate().decide(&path, None),
            GateDecision::RedirectToLogin(AccessDenial::MissingToken)
        );
    }

    #[test]
    fn arbitrary_tokens_never_admit(path in admin_path(), token in "[A-Za-z0-9._-]{1,80}") {
        let decision = gate().decide(&path, Some(&token));
        prop_assert!(matches!(decision, GateDecision::RedirectToLogin(_)));
    }

    #[test]
    fn foreign_secret_goes_to_login(path in admin_path(), secret in "[a-z]{32,40}") {
        prop_assume!(secret != SECRET);
        let token = sign(&secret, ADMIN, true);
        prop_assert!(matches!(gate().decide(&path, Some(&token)), GateDecision::RedirectToLogin(_)));
    }

    #[test]
    fn non_admin_or_other_identity_goes_to_unauthorized(
        path in admin_path(),
        username in "[a-z]{1,16}",
        is_admin in any::<bool>(),
    ) {
        prop_assume!(!(is_admin && username == ADMIN));
        let token = sign(SECRET, &username, is_admin);
        prop_assert!(matches!(
            gate().decide(&path, Some(&token)),
            GateDecision::RedirectToUnauthorized(_)
        ));
    }

    #[test]
    fn decision_is_deterministic(path in "/[a-z/]{0,16}", admin in any::<bool>(), username in "[a-z]{1,16}") {
        let g = gate();
        let token = sign(SECRET, &username, admin);
        prop_assert_eq!(g.decide(&path, Some(&token)), g.decide(&path, Some(&token)));
    }
}
