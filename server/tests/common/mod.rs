#![allow(dead_code)]

use std::fs;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::HeaderMap;
use hyper::{Request, StatusCode};
use server::auth::TokenIssuer;
use server::{AppService, AppState, build_service, database};
use shared::config::parse_config;
use tempfile::TempDir;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret-integration-secret!";
pub const ADMIN: &str = "shakibkumnale";
pub const PASSWORD: &str = "correct horse battery staple";

pub type Service = AppService<Full<Bytes>>;

pub struct TestApp {
    pub state: AppState,
    pub service: Service,
    // Keeps the static files alive for the duration of the test.
    pub web_dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get("location").and_then(|v| v.to_str().ok())
    }

    /// `name=value` part of the first `Set-Cookie` header.
    pub fn cookie_pair(&self) -> Option<String> {
        self.headers
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

fn write_site(dir: &TempDir) {
    let root = dir.path();
    fs::create_dir_all(root.join("admin")).unwrap();
    fs::create_dir_all(root.join("static")).unwrap();
    fs::write(root.join("index.html"), "<h1>home</h1>").unwrap();
    fs::write(root.join("login.html"), "<h1>login</h1>").unwrap();
    fs::write(root.join("unauthorized.html"), "<h1>unauthorized</h1>").unwrap();
    fs::write(root.join("admin/index.html"), "<h1>dashboard</h1>").unwrap();
    fs::write(root.join("static/site.css"), "body{}").unwrap();
}

/// App with the default gate, one admin and an optional login password.
pub async fn app(password_hash: Option<&str>) -> TestApp {
    app_with_extra(password_hash, "").await
}

/// Same as [`app`] with extra TOML appended (e.g. a `[server]` table).
pub async fn app_with_extra(password_hash: Option<&str>, extra: &str) -> TestApp {
    let web_dir = tempfile::tempdir().unwrap();
    write_site(&web_dir);

    let hash_line = password_hash
        .map(|h| format!("admin_password_hash = \"{}\"\n", h))
        .unwrap_or_default();

    let toml = format!(
        r#"
[paths]
web_dir = "{web_dir}"
database_url = "sqlite::memory:"

[auth]
jwt_secret = "{SECRET}"
admin_usernames = ["{ADMIN}"]
{hash_line}
{extra}
"#,
        web_dir = web_dir.path().display(),
    );
    let config = parse_config(&toml).unwrap();

    let db = database::connect_in_memory().await.unwrap();
    let state = AppState::new(config, db).unwrap();
    let service = build_service(state.clone());

    TestApp {
        state,
        service,
        web_dir,
    }
}

pub fn token(username: Option<&str>, is_admin: bool, ttl: i64) -> String {
    token_with_secret(SECRET, username, is_admin, ttl)
}

pub fn token_with_secret(secret: &str, username: Option<&str>, is_admin: bool, ttl: i64) -> String {
    TokenIssuer::new(secret, 3600)
        .sign(&TokenIssuer::claims_for(username, is_admin, ttl))
        .unwrap()
}

/// Sign an arbitrary JSON payload with the configured secret.
pub fn raw_token(payload: serde_json::Value) -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &payload,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn admin_cookie() -> String {
    format!("token={}", token(Some(ADMIN), true, 3600))
}

pub fn request(method: &str, uri: &str, cookie: Option<&str>, body: &str) -> Request<Full<Bytes>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    if !body.is_empty() {
        builder = builder.header("content-type", "application/json");
    }
    builder.body(Full::new(Bytes::from(body.to_string()))).unwrap()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Full<Bytes>> {
    request("GET", uri, cookie, "")
}

impl TestApp {
    pub async fn send(&self, req: Request<Full<Bytes>>) -> TestResponse {
        let res = self.service.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn send_admin_json(&self, method: &str, uri: &str, body: &str) -> TestResponse {
        let cookie = admin_cookie();
        self.send(request(method, uri, Some(&cookie), body)).await
    }
}
