use anyhow::{Result, anyhow};
use hyper::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, warn};

/// Extract a header value as a string
pub fn get_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract cookie value by name.
///
/// Every `Cookie` header is searched; a header that is not valid ASCII is
/// skipped, so an unreadable cookie behaves like an absent one.
pub fn get_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let found = headers
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookies| {
            cookies.split(';').find_map(|cookie| {
                let mut parts = cookie.trim().splitn(2, '=');
                let name = parts.next()?.trim();
                let value = parts.next()?.trim();
                (name == cookie_name).then(|| value.trim_matches('"').to_string())
            })
        });

    if found.is_none() {
        debug!("Cookie not found: {}", cookie_name);
    }
    found
}

/// Set a cookie with options
pub fn set_cookie(
    name: &str,
    value: &str,
    max_age: Option<Duration>,
    path: Option<&str>,
    http_only: bool,
    secure: bool,
) -> Result<HeaderValue> {
    let mut cookie = format!("{}={}", name, value);

    if let Some(age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", age.as_secs()));
    }

    if let Some(p) = path {
        cookie.push_str(&format!("; Path={}", p));
    }

    if http_only {
        cookie.push_str("; HttpOnly");
    }

    if secure {
        cookie.push_str("; Secure");
    }

    cookie.push_str("; SameSite=Strict");

    debug!("Setting cookie: {}", name);

    HeaderValue::from_str(&cookie).map_err(|e| {
        warn!("Failed to create cookie header for {}: {}", name, e);
        anyhow!("Invalid cookie value: {}", e)
    })
}

/// Create a persistent cookie with expiration
pub fn create_persistent_cookie(
    name: &str,
    value: &str,
    max_age: Duration,
    secure: bool,
) -> Result<HeaderValue> {
    debug!(
        "Creating persistent cookie: {} with max_age: {:?}",
        name, max_age
    );
    set_cookie(name, value, Some(max_age), Some("/"), true, secure)
}

/// Delete a cookie by setting it to expire
pub fn delete_cookie(name: &str, secure: bool) -> Result<HeaderValue> {
    debug!("Deleting cookie: {}", name);
    set_cookie(
        name,
        "",
        Some(Duration::from_secs(0)),
        Some("/"),
        true,
        secure,
    )
}

/// Add no-cache headers so browsers and proxies never reuse an auth answer
pub fn add_no_cache_headers<T>(mut res: hyper::Response<T>) -> hyper::Response<T> {
    let headers = res.headers_mut();

    headers.insert(
        "cache-control",
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert("pragma", HeaderValue::from_static("no-cache"));
    headers.insert("expires", HeaderValue::from_static("0"));
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );

    res
}

/// Add long-lived public cache headers for fingerprinted static assets
pub fn add_cache_headers_with_max_age<T>(
    mut res: hyper::Response<T>,
    max_age_seconds: u64,
) -> hyper::Response<T> {
    let headers = res.headers_mut();

    let cache_control = format!("public, max-age={}", max_age_seconds);
    headers.insert(
        "cache-control",
        HeaderValue::from_str(&cache_control)
            .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=3600")),
    );
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );

    res
}

/// Returns true only when the request arrived over a secure (HTTPS) connection.
///
/// Checks `X-Forwarded-Proto: https`, then `X-Forwarded-Ssl: on`, then an
/// absolute-form `https` URI. Falls back to `false` so that plain HTTP dev
/// servers work out of the box.
pub fn is_https<B>(req: &hyper::Request<B>) -> bool {
    let headers = req.headers();

    if get_header_value(headers, "x-forwarded-proto")
        .map(|v| v.eq_ignore_ascii_case("https"))
        .unwrap_or(false)
    {
        return true;
    }

    if get_header_value(headers, "x-forwarded-ssl")
        .map(|v| v.eq_ignore_ascii_case("on"))
        .unwrap_or(false)
    {
        return true;
    }

    req.uri()
        .scheme()
        .map(|s| s.as_str() == "https")
        .unwrap_or(false)
}

/// Parse the query string into `(key, value)` pairs.
pub fn query_pairs<B>(req: &hyper::Request<B>) -> Vec<(String, String)> {
    req.uri()
        .query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// First value for `key` in the query string, blank values ignored.
pub fn query_param<B>(req: &hyper::Request<B>, key: &str) -> Option<String> {
    query_pairs(req)
        .into_iter()
        .find(|(k, v)| k == key && !v.trim().is_empty())
        .map(|(_, v)| v.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert("cookie", HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn cookie_found_among_several() {
        let h = headers_with_cookie("a=1; token=abc.def.ghi; b=2");
        assert_eq!(get_cookie(&h, "token").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn cookie_name_must_match_exactly() {
        let h = headers_with_cookie("xtoken=1; tokenx=2");
        assert_eq!(get_cookie(&h, "token"), None);
    }

    #[test]
    fn cookie_across_multiple_headers() {
        let mut h = HeaderMap::new();
        h.append("cookie", HeaderValue::from_static("a=1"));
        h.append("cookie", HeaderValue::from_static("token=t"));
        assert_eq!(get_cookie(&h, "token").as_deref(), Some("t"));
    }

    #[test]
    fn empty_cookie_value_is_returned_as_empty() {
        let h = headers_with_cookie("token=");
        assert_eq!(get_cookie(&h, "token").as_deref(), Some(""));
    }

    #[test]
    fn set_cookie_has_strict_attributes() {
        let v = create_persistent_cookie("token", "abc", Duration::from_secs(60), true).unwrap();
        let s = v.to_str().unwrap();
        assert!(s.starts_with("token=abc"));
        assert!(s.contains("Max-Age=60"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("Secure"));
        assert!(s.contains("SameSite=Strict"));
    }

    #[test]
    fn delete_cookie_expires_immediately() {
        let v = delete_cookie("token", false).unwrap();
        assert!(v.to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn forwarded_proto_marks_https() {
        let req = hyper::Request::builder()
            .uri("/api/login")
            .header("x-forwarded-proto", "HTTPS")
            .body(())
            .unwrap();
        assert!(is_https(&req));
        let plain = hyper::Request::builder().uri("/").body(()).unwrap();
        assert!(!is_https(&plain));
    }

    #[test]
    fn query_param_decodes_values() {
        let req = hyper::Request::builder()
            .uri("/x?artist_id=a%20b&empty=&k=1")
            .body(())
            .unwrap();
        assert_eq!(query_param(&req, "artist_id").as_deref(), Some("a b"));
        assert_eq!(query_param(&req, "empty"), None);
        assert_eq!(query_param(&req, "missing"), None);
    }
}
