use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use hyper::header::HeaderValue;
use hyper::{Response, StatusCode, header};
use serde::Serialize;
use shared::types::{ErrorResponse, SuccessResponse};
use tracing::{debug, warn};

use super::deliver_page::full;
use crate::handlers::http::HttpResponse;

/// Serialize any `Serialize` type and deliver it as a JSON response.
/// This is the primary helper all handlers should use instead of
/// writing their own one-off serialization + response-building blocks.
pub fn deliver_serialized_json<T: Serialize>(data: &T, status: StatusCode) -> Result<HttpResponse> {
    let json = serde_json::to_string(data).context("Failed to serialize response")?;

    debug!("Delivering serialized JSON response, size: {} bytes", json.len());

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(full(Bytes::from(json)))
        .map_err(|e| anyhow!("Failed to build JSON response: {}", e))
}

/// `{"status":"success","data":...}` with the given status.
pub fn deliver_success_json<T: Serialize>(data: T, status: StatusCode) -> Result<HttpResponse> {
    deliver_serialized_json(&SuccessResponse::new(data), status)
}

/// Delivers a JSON error response with the specified error code, message, and status.
pub fn deliver_error_json(error_code: &str, message: &str, status: StatusCode) -> Result<HttpResponse> {
    if status.is_server_error() {
        warn!(
            "Delivering error JSON: {} - {} ({})",
            status.as_u16(),
            error_code,
            message
        );
    } else {
        debug!(
            "Delivering error JSON: {} - {} ({})",
            status.as_u16(),
            error_code,
            message
        );
    }

    deliver_serialized_json(&ErrorResponse::new(error_code, message), status)
}

/// Last-resort error body for the service boundary. Cannot fail.
pub fn fallback_error(status: StatusCode, code: &str, message: &str) -> HttpResponse {
    let body = serde_json::to_string(&ErrorResponse::new(code, message))
        .unwrap_or_else(|_| r#"{"status":"error"}"#.to_string());

    let mut res = Response::new(full(body));
    *res.status_mut() = status;
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    res
}

pub fn not_found() -> Result<HttpResponse> {
    deliver_error_json("NOT_FOUND", "Endpoint not found", StatusCode::NOT_FOUND)
}

pub fn bad_request(message: &str) -> Result<HttpResponse> {
    deliver_error_json("BAD_REQUEST", message, StatusCode::BAD_REQUEST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(res: HttpResponse) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn error_json_has_standard_shape() {
        let res = deliver_error_json("NOPE", "no", StatusCode::CONFLICT).unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(res).await,
            serde_json::json!({"status": "error", "code": "NOPE", "message": "no"})
        );
    }

    #[tokio::test]
    async fn success_json_wraps_data() {
        let res = deliver_success_json(vec!["a"], StatusCode::CREATED).unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(body_json(res).await["data"][0], "a");
    }

    #[tokio::test]
    async fn fallback_error_is_json() {
        let res = fallback_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "boom");
        assert_eq!(res.headers()["content-type"], "application/json");
        assert_eq!(body_json(res).await["code"], "INTERNAL_ERROR");
    }
}
