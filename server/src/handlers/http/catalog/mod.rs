use anyhow::Result;
use hyper::StatusCode;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::database::StoreError;
use crate::handlers::http::utils::deliver_error_json;
use crate::handlers::http::{HttpRequest, HttpResponse};

pub mod artists;
pub mod releases;

pub use artists::{
    handle_create_artist, handle_delete_artist, handle_get_artist, handle_list_artist_releases,
    handle_list_artists, handle_update_artist,
};
pub use releases::{
    handle_create_release, handle_delete_release, handle_get_release, handle_list_releases,
    handle_update_release,
};

/// Decode a JSON request body, answering 400 `INVALID_JSON` on failure.
pub(crate) fn parse_json_body<T: DeserializeOwned>(
    req: &HttpRequest,
) -> std::result::Result<T, Result<HttpResponse>> {
    serde_json::from_slice(req.body()).map_err(|e| {
        warn!("Rejected JSON body for {}: {}", req.uri().path(), e);
        deliver_error_json(
            "INVALID_JSON",
            &format!("Invalid JSON body: {}", e),
            StatusCode::BAD_REQUEST,
        )
    })
}

/// Client-facing store failures become JSON errors; storage faults
/// propagate and end up as a 500 at the service boundary.
pub(crate) fn store_error_response(e: StoreError) -> Result<HttpResponse> {
    match e {
        StoreError::NotFound(what) => deliver_error_json(
            "NOT_FOUND",
            &format!("{} not found", what),
            StatusCode::NOT_FOUND,
        ),
        StoreError::Conflict(msg) => deliver_error_json("CONFLICT", &msg, StatusCode::CONFLICT),
        StoreError::MissingReference(msg) => {
            deliver_error_json("VALIDATION_FAILED", &msg, StatusCode::UNPROCESSABLE_ENTITY)
        }
        StoreError::Invalid(v) => deliver_error_json(
            "VALIDATION_FAILED",
            &v.to_string(),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        e @ (StoreError::Database(_) | StoreError::Serialization(_)) => Err(e.into()),
    }
}
