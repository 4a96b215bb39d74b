use std::convert::Infallible;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, combinators::BoxBody};
use hyper::header::HeaderValue;
use hyper::{Response, StatusCode, header};
use tracing::{debug, error};

use super::headers;
use crate::handlers::http::HttpResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStrategy {
    Yes, // 1 year, for /static assets
    No,  // no-cache, for HTML
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStrategy::Yes => write!(f, "Yes (1 year)"),
            CacheStrategy::No => write!(f, "No (no-cache)"),
        }
    }
}

/// Expand tilde (~) in path to home directory
fn expand_tilde<P: AsRef<Path>>(path: P) -> PathBuf {
    let path_ref: &Path = path.as_ref();
    let path_str: &str = path_ref.to_str().unwrap_or("");

    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            let mut home_path: PathBuf = PathBuf::from(home);
            home_path.push(rest);
            return home_path;
        }
    }

    path_ref.to_path_buf()
}

/// Read a file from disk and deliver it with caching headers.
///
/// Returns `Ok(None)` when the file does not exist so the router can answer
/// with its own 404.
pub async fn deliver_static_file<P: AsRef<Path>>(
    file_path: P,
    cache: CacheStrategy,
) -> Result<Option<HttpResponse>> {
    let expanded_path: PathBuf = expand_tilde(file_path);

    debug!(
        "Reading static file from: {} (cache: {})",
        expanded_path.display(),
        cache
    );

    let content = match tokio::fs::read(&expanded_path).await {
        Ok(content) => content,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
            debug!("Static file missing: {}", expanded_path.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to read static file: {}", expanded_path.display())
            });
        }
    };

    let mime_type: &str = get_mime_type(&expanded_path);

    let response: HttpResponse = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type)
        .body(full(content))
        .map_err(|e| anyhow!("Failed to build response: {}", e))?;

    Ok(Some(match cache {
        CacheStrategy::Yes => headers::add_cache_headers_with_max_age(response, 31_536_000),
        CacheStrategy::No => headers::add_no_cache_headers(response),
    }))
}

/// Helper function to determine MIME type from file extension
fn get_mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|s| s.to_str()) {
        // Web documents
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("webmanifest") => "application/manifest+json",

        // Images
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",

        // Media
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",

        Some("txt") => "text/plain; charset=utf-8",

        // Default
        _ => "application/octet-stream",
    }
}

/// Delivers a redirect response
pub fn deliver_redirect(location: &str) -> Result<HttpResponse> {
    debug!("Delivering redirect to: {}", location);

    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location)
        .body(empty())
        .map_err(|e: http::Error| {
            error!("Failed to build redirect response to {}: {}", location, e);
            anyhow!("Failed to build redirect response: {}", e)
        })
}

/// Infallible `302 Found` used by the admin gate. Never cached.
pub fn redirect_response(location: &str) -> HttpResponse {
    let location = HeaderValue::from_str(location).unwrap_or_else(|_| {
        error!("Redirect target is not a valid header value: {:?}", location);
        HeaderValue::from_static("/")
    });

    let mut res = Response::new(empty());
    *res.status_mut() = StatusCode::FOUND;
    res.headers_mut().insert(header::LOCATION, location);
    headers::add_no_cache_headers(res)
}

/// Helper function to create an empty body
pub fn empty() -> BoxBody<Bytes, Infallible> {
    full(Bytes::new())
}

/// Helper function to create a full body from various types
pub fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, Infallible> {
    Full::new(chunk.into()).boxed()
}
