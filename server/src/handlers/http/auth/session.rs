use anyhow::Result;
use hyper::StatusCode;
use shared::types::{AdminVerification, AuthStatus};
use tracing::{debug, warn};

use crate::AppState;
use crate::auth::AccessDenial;
use crate::handlers::http::utils::{add_no_cache_headers, deliver_serialized_json, get_cookie};
use crate::handlers::http::{HttpRequest, HttpResponse};

fn session_token(req: &HttpRequest, state: &AppState) -> Option<String> {
    get_cookie(req.headers(), state.gate.cookie_name())
}

/// `GET /api/auth/status`
///
/// Absent cookie is a normal anonymous visitor (200); a cookie that fails
/// verification is 401. A genuine but non-admin session is still
/// authenticated.
pub async fn handle_status(req: HttpRequest, state: AppState) -> Result<HttpResponse> {
    let token = session_token(&req, &state);

    let (status, body) = match state.gate.verifier().check(token.as_deref()) {
        Ok(claims) => (
            StatusCode::OK,
            AuthStatus::authenticated(claims.username, true),
        ),
        Err(AccessDenial::MissingToken) => (StatusCode::OK, AuthStatus::anonymous()),
        Err(AccessDenial::InvalidSignature(reason)) => {
            debug!("Status query with invalid token: {}", reason);
            (StatusCode::UNAUTHORIZED, AuthStatus::anonymous())
        }
        Err(
            AccessDenial::InsufficientPrivilege { claims }
            | AccessDenial::IdentityMismatch { claims },
        ) => (
            StatusCode::OK,
            AuthStatus::authenticated(claims.username, false),
        ),
    };

    Ok(add_no_cache_headers(deliver_serialized_json(&body, status)?))
}

/// `GET /api/auth/verify-admin`
pub async fn handle_verify_admin(req: HttpRequest, state: AppState) -> Result<HttpResponse> {
    let token = session_token(&req, &state);

    let (status, body) = match state.gate.verifier().check(token.as_deref()) {
        Ok(claims) => (StatusCode::OK, AdminVerification::granted(claims.username)),
        Err(AccessDenial::MissingToken) => (
            StatusCode::UNAUTHORIZED,
            AdminVerification::denied(None, "No token provided"),
        ),
        Err(AccessDenial::InvalidSignature(reason)) => {
            debug!("Verify-admin with invalid token: {}", reason);
            (
                StatusCode::UNAUTHORIZED,
                AdminVerification::denied(None, "Invalid or expired token"),
            )
        }
        Err(AccessDenial::InsufficientPrivilege { claims }) => {
            warn!("Verify-admin refused, not an admin: {:?}", claims.username);
            (
                StatusCode::FORBIDDEN,
                AdminVerification::denied(claims.username, "Admin privileges required"),
            )
        }
        Err(AccessDenial::IdentityMismatch { claims }) => {
            warn!("Verify-admin refused, unknown identity: {:?}", claims.username);
            (
                StatusCode::FORBIDDEN,
                AdminVerification::denied(claims.username, "Not an authorized admin"),
            )
        }
    };

    Ok(add_no_cache_headers(deliver_serialized_json(&body, status)?))
}
