use anyhow::{Context, Result};
use hyper::header::{CONTENT_TYPE, SET_COOKIE};
use hyper::{Response, StatusCode};
use tracing::info;

use crate::AppState;
use crate::handlers::http::utils;
use crate::handlers::http::{HttpRequest, HttpResponse};

/// `POST /api/logout`: expire the session cookie.
pub async fn handle_logout(req: HttpRequest, state: AppState) -> Result<HttpResponse> {
    info!("Admin logged out");

    let secure = state.config.auth.secure_cookies || utils::is_https(&req);
    let clear_cookie = utils::delete_cookie(state.gate.cookie_name(), secure)
        .context("Failed to build logout cookie")?;

    let response_json = serde_json::json!({
        "status": "success",
        "message": "Logged out successfully"
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .header(SET_COOKIE, clear_cookie)
        .body(utils::full(response_json.to_string()))
        .context("Failed to build logout response")?;

    Ok(utils::add_no_cache_headers(response))
}
