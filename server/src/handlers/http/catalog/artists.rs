use anyhow::Result;
use hyper::StatusCode;
use shared::types::{ArtistInput, SessionClaims};
use tracing::info;

use super::{parse_json_body, store_error_response};
use crate::AppState;
use crate::database::{artists, releases};
use crate::handlers::http::routes::path_param;
use crate::handlers::http::utils::{bad_request, deliver_error_json, deliver_success_json};
use crate::handlers::http::{HttpRequest, HttpResponse};

/// `GET /api/artists`
pub async fn handle_list_artists(_req: HttpRequest, state: AppState) -> Result<HttpResponse> {
    match artists::list_artists(&state.db).await {
        Ok(list) => deliver_success_json(list, StatusCode::OK),
        Err(e) => store_error_response(e),
    }
}

/// `GET /api/artists/:id` (id or slug)
pub async fn handle_get_artist(req: HttpRequest, state: AppState) -> Result<HttpResponse> {
    let Some(id) = path_param(&req, "id") else {
        return bad_request("Missing artist id");
    };

    match artists::get_artist(&state.db, id).await {
        Ok(Some(artist)) => deliver_success_json(artist, StatusCode::OK),
        Ok(None) => deliver_error_json("NOT_FOUND", "Artist not found", StatusCode::NOT_FOUND),
        Err(e) => store_error_response(e),
    }
}

/// `GET /api/artists/:id/releases`
pub async fn handle_list_artist_releases(req: HttpRequest, state: AppState) -> Result<HttpResponse> {
    let Some(id) = path_param(&req, "id") else {
        return bad_request("Missing artist id");
    };

    let artist = match artists::get_artist(&state.db, id).await {
        Ok(Some(artist)) => artist,
        Ok(None) => {
            return deliver_error_json("NOT_FOUND", "Artist not found", StatusCode::NOT_FOUND);
        }
        Err(e) => return store_error_response(e),
    };

    match releases::list_releases(&state.db, Some(&artist.id)).await {
        Ok(list) => deliver_success_json(list, StatusCode::OK),
        Err(e) => store_error_response(e),
    }
}

/// `POST {prefix}/api/artists`
pub async fn handle_create_artist(
    req: HttpRequest,
    state: AppState,
    claims: SessionClaims,
) -> Result<HttpResponse> {
    let input: ArtistInput = match parse_json_body(&req) {
        Ok(input) => input,
        Err(response) => return response,
    };

    match artists::create_artist(&state.db, input).await {
        Ok(artist) => {
            info!(
                "{} created artist {}",
                claims.username().unwrap_or("admin"),
                artist.id
            );
            deliver_success_json(artist, StatusCode::CREATED)
        }
        Err(e) => store_error_response(e),
    }
}

/// `PUT {prefix}/api/artists/:id`
pub async fn handle_update_artist(
    req: HttpRequest,
    state: AppState,
    claims: SessionClaims,
) -> Result<HttpResponse> {
    let Some(id) = path_param(&req, "id").map(str::to_string) else {
        return bad_request("Missing artist id");
    };
    let input: ArtistInput = match parse_json_body(&req) {
        Ok(input) => input,
        Err(response) => return response,
    };

    match artists::update_artist(&state.db, &id, input).await {
        Ok(artist) => {
            info!("{} updated artist {}", claims.username().unwrap_or("admin"), id);
            deliver_success_json(artist, StatusCode::OK)
        }
        Err(e) => store_error_response(e),
    }
}

/// `DELETE {prefix}/api/artists/:id`
pub async fn handle_delete_artist(
    req: HttpRequest,
    state: AppState,
    claims: SessionClaims,
) -> Result<HttpResponse> {
    let Some(id) = path_param(&req, "id") else {
        return bad_request("Missing artist id");
    };

    match artists::delete_artist(&state.db, id).await {
        Ok(removed_releases) => {
            info!(
                "{} deleted artist {} ({} releases)",
                claims.username().unwrap_or("admin"),
                id,
                removed_releases
            );
            deliver_success_json(
                serde_json::json!({ "deleted": id, "releases_deleted": removed_releases }),
                StatusCode::OK,
            )
        }
        Err(e) => store_error_response(e),
    }
}
