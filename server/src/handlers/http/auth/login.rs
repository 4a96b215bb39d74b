use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use hyper::header::{CONTENT_TYPE, SET_COOKIE};
use hyper::{Response, StatusCode};
use shared::types::{LoginData, LoginError, LoginResponse};
use tracing::{error, info, warn};

use crate::AppState;
use crate::auth::verify_password;
use crate::handlers::http::utils::{self, deliver_serialized_json};
use crate::handlers::http::{HttpRequest, HttpResponse};

/// `POST /api/login` (JSON or form-encoded)
pub async fn handle_login(req: HttpRequest, state: AppState) -> Result<HttpResponse> {
    info!("Processing admin login request");

    let secure = state.config.auth.secure_cookies || utils::is_https(&req);

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let parsed = if content_type.contains("application/json") {
        parse_login_json(req.body())
    } else {
        parse_login_form(req.body())
    };

    let login_data = match parsed.and_then(LoginData::validated) {
        Ok(data) => data,
        Err(e) => {
            warn!("Admin login rejected: {}", e.to_code());
            return deliver_serialized_json(&e.to_response(), StatusCode::BAD_REQUEST);
        }
    };

    let username = match attempt_login(&login_data, &state) {
        Ok(username) => username,
        Err(e) => {
            warn!("Admin login failed: {}", e.to_code());
            return deliver_serialized_json(&e.to_response(), status_for(&e));
        }
    };

    let (token, _claims) = state
        .issuer
        .issue_admin(&username)
        .context("Failed to issue session token")?;
    let expires_in = state.issuer.expiry_secs();

    let cookie = utils::create_persistent_cookie(
        state.gate.cookie_name(),
        &token,
        Duration::from_secs(expires_in),
        secure,
    )
    .context("Failed to create session cookie")?;

    let response_data = LoginResponse::Success {
        username: username.clone(),
        expires_in,
        message: "Admin login successful".to_string(),
        redirect: state.gate.config().protected_prefix.clone(),
    };

    let json = serde_json::to_string(&response_data).context("Failed to serialize response")?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .header(SET_COOKIE, cookie)
        .body(utils::full(json))
        .context("Failed to build response")?;

    info!("Admin logged in successfully: {}", username);
    Ok(utils::add_no_cache_headers(response))
}

fn status_for(e: &LoginError) -> StatusCode {
    match e {
        LoginError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        LoginError::MissingField(_) | LoginError::InvalidBody => StatusCode::BAD_REQUEST,
        LoginError::LoginDisabled => StatusCode::SERVICE_UNAVAILABLE,
        LoginError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Parse login JSON data
fn parse_login_json(body: &[u8]) -> std::result::Result<LoginData, LoginError> {
    serde_json::from_slice::<LoginData>(body).map_err(|e| {
        warn!("Failed to parse admin login JSON: {}", e);
        LoginError::InvalidBody
    })
}

/// Parse login form data
fn parse_login_form(body: &[u8]) -> std::result::Result<LoginData, LoginError> {
    let mut params = form_urlencoded::parse(body)
        .into_owned()
        .collect::<HashMap<String, String>>();

    let username = params
        .remove("username")
        .ok_or(LoginError::MissingField("username".to_string()))?;

    let password = params
        .remove("password")
        .ok_or(LoginError::MissingField("password".to_string()))?;

    Ok(LoginData { username, password })
}

/// Identity and password must both check out. Either failure is reported
/// the same way so the response does not reveal which admin names exist.
fn attempt_login(data: &LoginData, state: &AppState) -> std::result::Result<String, LoginError> {
    let Some(hash) = state.admin_password_hash.as_deref() else {
        warn!("Login attempted but no admin password hash is configured");
        return Err(LoginError::LoginDisabled);
    };

    let password_valid = verify_password(hash, &data.password).map_err(|e| {
        error!("Password verification error: {}", e);
        LoginError::InternalError
    })?;

    let identity_valid = state.gate.verifier().identities().is_authorized(&data.username);

    if !(password_valid && identity_valid) {
        warn!("Invalid credentials for admin: {}", data.username);
        return Err(LoginError::InvalidCredentials);
    }

    Ok(data.username.clone())
}
