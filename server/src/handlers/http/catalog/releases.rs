use anyhow::Result;
use hyper::StatusCode;
use shared::types::{ReleaseInput, SessionClaims};
use tracing::info;

use super::{parse_json_body, store_error_response};
use crate::AppState;
use crate::database::releases;
use crate::handlers::http::routes::path_param;
use crate::handlers::http::utils::{bad_request, deliver_error_json, deliver_success_json, query_param};
use crate::handlers::http::{HttpRequest, HttpResponse};

/// `GET /api/releases[?artist_id=]`
pub async fn handle_list_releases(req: HttpRequest, state: AppState) -> Result<HttpResponse> {
    let artist_id = query_param(&req, "artist_id");

    match releases::list_releases(&state.db, artist_id.as_deref()).await {
        Ok(list) => deliver_success_json(list, StatusCode::OK),
        Err(e) => store_error_response(e),
    }
}

/// `GET /api/releases/:id`
pub async fn handle_get_release(req: HttpRequest, state: AppState) -> Result<HttpResponse> {
    let Some(id) = path_param(&req, "id") else {
        return bad_request("Missing release id");
    };

    match releases::get_release(&state.db, id).await {
        Ok(Some(release)) => deliver_success_json(release, StatusCode::OK),
        Ok(None) => deliver_error_json("NOT_FOUND", "Release not found", StatusCode::NOT_FOUND),
        Err(e) => store_error_response(e),
    }
}

/// `POST {prefix}/api/releases`
pub async fn handle_create_release(
    req: HttpRequest,
    state: AppState,
    claims: SessionClaims,
) -> Result<HttpResponse> {
    let input: ReleaseInput = match parse_json_body(&req) {
        Ok(input) => input,
        Err(response) => return response,
    };

    match releases::create_release(&state.db, input).await {
        Ok(release) => {
            info!(
                "{} created release {}",
                claims.username().unwrap_or("admin"),
                release.id
            );
            deliver_success_json(release, StatusCode::CREATED)
        }
        Err(e) => store_error_response(e),
    }
}

/// `PUT {prefix}/api/releases/:id`
pub async fn handle_update_release(
    req: HttpRequest,
    state: AppState,
    claims: SessionClaims,
) -> Result<HttpResponse> {
    let Some(id) = path_param(&req, "id").map(str::to_string) else {
        return bad_request("Missing release id");
    };
    let input: ReleaseInput = match parse_json_body(&req) {
        Ok(input) => input,
        Err(response) => return response,
    };

    match releases::update_release(&state.db, &id, input).await {
        Ok(release) => {
            info!("{} updated release {}", claims.username().unwrap_or("admin"), id);
            deliver_success_json(release, StatusCode::OK)
        }
        Err(e) => store_error_response(e),
    }
}

/// `DELETE {prefix}/api/releases/:id`
pub async fn handle_delete_release(
    req: HttpRequest,
    state: AppState,
    claims: SessionClaims,
) -> Result<HttpResponse> {
    let Some(id) = path_param(&req, "id") else {
        return bad_request("Missing release id");
    };

    match releases::delete_release(&state.db, id).await {
        Ok(()) => {
            info!("{} deleted release {}", claims.username().unwrap_or("admin"), id);
            deliver_success_json(serde_json::json!({ "deleted": id }), StatusCode::OK)
        }
        Err(e) => store_error_response(e),
    }
}
