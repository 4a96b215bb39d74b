use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use hyper::{Method, StatusCode};
use shared::types::{GateConfig, SessionClaims};
use tracing::{error, info};

use crate::AppState;
use crate::handlers::http::utils::*;
use crate::handlers::http::{HttpRequest, HttpResponse, admin, auth, catalog};

// ---------------------------------------------------------------------------
// Handler type aliases
// ---------------------------------------------------------------------------
//
// Two tiers:
//
//   RouteHandler  — no auth.  Receives (req, state).
//                   Use for: public catalog reads, login, status queries.
//
//   AdminHandler  — registered under the protected prefix.  Receives
//                   (req, state, claims) where `claims` were attached by the
//                   admin gate layer.  Handlers must NOT re-verify the token.

/// Directory under the web root holding the admin single-page app.
const ADMIN_SHELL_DIR: &str = "/admin/";

type HandlerFuture = Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send>>;

type RouteHandler = Box<dyn Fn(HttpRequest, AppState) -> HandlerFuture + Send + Sync>;

type AdminHandler = Box<dyn Fn(HttpRequest, AppState, SessionClaims) -> HandlerFuture + Send + Sync>;

// ---------------------------------------------------------------------------
// RouteKind
// ---------------------------------------------------------------------------

enum RouteKind {
    /// No authentication check.
    Open(RouteHandler),

    /// Requires claims from the admin gate in the request extensions.
    Admin(AdminHandler),
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

struct Route {
    method: Method,
    path: String,
    kind: RouteKind,
}

/// `:name` segments captured while matching, stored in request extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Read a captured path parameter from a routed request.
pub fn path_param<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.extensions()
        .get::<PathParams>()
        .and_then(|p| p.get(name))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    routes: Vec<Route>,
    web_dir: Option<String>,
    gate: GateConfig,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .field("web_dir", &self.web_dir)
            .field("protected_prefix", &self.gate.protected_prefix)
            .finish()
    }
}

impl Router {
    pub fn new(gate: GateConfig) -> Self {
        Self {
            routes: Vec::new(),
            web_dir: None,
            gate,
        }
    }

    pub fn with_web_dir(mut self, web_dir: String) -> Self {
        self.web_dir = Some(web_dir);
        self
    }

    fn open<F, Fut>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(HttpRequest, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    fn admin<F, Fut>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(HttpRequest, AppState, SessionClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        // Admin routes always live under the protected prefix so the gate
        // layer sees them.
        let path = format!("{}{}", self.gate.protected_prefix.trim_end_matches('/'), path);
        self.routes.push(Route {
            method,
            path,
            kind: RouteKind::Admin(Box::new(move |req, state, claims| {
                Box::pin(handler(req, state, claims))
            })),
        });
        self
    }

    // ── Open (no auth) ────────────────────────────────────────────────────────

    pub fn get<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(HttpRequest, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.open(Method::GET, path, handler)
    }

    pub fn post<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(HttpRequest, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.open(Method::POST, path, handler)
    }

    // ── Admin (gate-admitted) ─────────────────────────────────────────────────
    //
    // `path` is relative to the protected prefix: `"/api/artists"` registers
    // `"/admin/api/artists"` with the default config.

    pub fn get_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(HttpRequest, AppState, SessionClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.admin(Method::GET, path, handler)
    }

    pub fn post_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(HttpRequest, AppState, SessionClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.admin(Method::POST, path, handler)
    }

    pub fn put_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(HttpRequest, AppState, SessionClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.admin(Method::PUT, path, handler)
    }

    pub fn delete_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(HttpRequest, AppState, SessionClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.admin(Method::DELETE, path, handler)
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    pub async fn route(&self, mut req: HttpRequest, state: AppState) -> Result<HttpResponse> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        for route in &self.routes {
            if route.method != method {
                continue;
            }
            let Some(params) = Self::match_path(&route.path, &path) else {
                continue;
            };
            req.extensions_mut().insert(params);

            return match &route.kind {
                RouteKind::Open(h) => h(req, state).await,

                RouteKind::Admin(h) => match req.extensions().get::<SessionClaims>().cloned() {
                    Some(claims) => h(req, state, claims).await,
                    None => {
                        // Only reachable when the gate layer is missing from
                        // the stack or the prefix was misconfigured.
                        error!("Admin route {} {} reached without gate claims", method, path);
                        deliver_redirect(&self.gate.login_path)
                    }
                },
            };
        }

        if method == Method::GET || method == Method::HEAD {
            if let Some(static_response) = self.try_serve_static(&path, &state).await? {
                return Ok(static_response);
            }
        }

        not_found().context("Failed to deliver 404 response")
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        Self::match_path(route_path, request_path).is_some()
    }

    /// Exact or segment-by-segment match with `:param` wildcards,
    /// e.g. `"/api/artists/:id"` matches `"/api/artists/42"`.
    fn match_path(route_path: &str, request_path: &str) -> Option<PathParams> {
        // Strip query string from incoming request path before comparing.
        let clean = request_path.split('?').next().unwrap_or(request_path);

        if route_path == clean {
            return Some(PathParams::default());
        }

        let route_segs: Vec<&str> = route_path.split('/').collect();
        let path_segs: Vec<&str> = clean.split('/').collect();

        if route_segs.len() != path_segs.len() {
            return None;
        }

        let mut params = Vec::new();
        for (r, p) in route_segs.iter().zip(path_segs.iter()) {
            match r.strip_prefix(':') {
                Some(name) if !p.is_empty() => params.push((name.to_string(), p.to_string())),
                Some(_) => return None,
                None if r == p => {}
                None => return None,
            }
        }
        Some(PathParams(params))
    }

    // ── Static file fallback ──────────────────────────────────────────────────

    async fn try_serve_static(&self, path: &str, state: &AppState) -> Result<Option<HttpResponse>> {
        // No escaping the web root.
        if path.split('/').any(|seg| seg == ".." || seg.contains('\\')) {
            return Ok(None);
        }

        let web_dir = self
            .web_dir
            .as_deref()
            .unwrap_or(&state.config.paths.web_dir)
            .trim_end_matches('/');
        let prefix = self.gate.protected_prefix.trim_end_matches('/');

        let (file, cache) = match path {
            "/" | "/index.html" => ("/index.html".to_string(), CacheStrategy::No),
            p if p == self.gate.login_path => ("/login.html".to_string(), CacheStrategy::No),
            p if p == self.gate.unauthorized_path => {
                ("/unauthorized.html".to_string(), CacheStrategy::No)
            }
            p if p.starts_with("/static/") => (p.to_string(), CacheStrategy::Yes),
            // Admin single-page app: every non-API path under the prefix.
            p if p == prefix
                || (p.starts_with(&format!("{}/", prefix))
                    && !p.starts_with(&format!("{}/api/", prefix))) =>
            {
                (format!("{}index.html", ADMIN_SHELL_DIR), CacheStrategy::No)
            }
            // The admin shell directory is only reachable through the prefix.
            p if p.starts_with(ADMIN_SHELL_DIR) => return Ok(None),
            p if p.ends_with(".html") => (p.to_string(), CacheStrategy::No),
            _ => return Ok(None),
        };

        let file_path = format!("{}{}", web_dir, file);
        deliver_static_file(&file_path, cache)
            .await
            .with_context(|| format!("Failed to deliver {}", file_path))
    }
}

// ---------------------------------------------------------------------------
// Site router
//
// Auth tier is enforced by the gate layer and checked again here at the
// routing level — handlers MUST NOT repeat the auth call.  The contract is:
//
//   .get(...) / .post(...)   → Open   — handler gets (req, state)
//   .*_admin(...)            → Admin  — handler gets (req, state, claims)
// ---------------------------------------------------------------------------

pub fn build_router(gate: &GateConfig, web_dir: Option<String>) -> Router {
    let mut router = Router::new(gate.clone());
    if let Some(dir) = web_dir {
        router = router.with_web_dir(dir);
    }

    info!(
        "Building router (protected prefix: {})",
        gate.protected_prefix
    );

    router
        // ── Public ───────────────────────────────────────────────────────────
        .get("/health", |_req, _state| async move {
            deliver_serialized_json(
                &serde_json::json!({"status": "success", "health": "ok"}),
                StatusCode::OK,
            )
        })
        .post("/api/login", |req, state| async move {
            auth::handle_login(req, state).await.context("Login failed")
        })
        .post("/api/logout", |req, state| async move {
            auth::handle_logout(req, state).await.context("Logout failed")
        })
        .get("/api/auth/status", |req, state| async move {
            auth::handle_status(req, state).await.context("Status query failed")
        })
        .get("/api/auth/verify-admin", |req, state| async move {
            auth::handle_verify_admin(req, state)
                .await
                .context("Verify admin failed")
        })
        .get("/api/artists", |req, state| async move {
            catalog::handle_list_artists(req, state)
                .await
                .context("Artist list failed")
        })
        .get("/api/artists/:id", |req, state| async move {
            catalog::handle_get_artist(req, state)
                .await
                .context("Artist get failed")
        })
        .get("/api/artists/:id/releases", |req, state| async move {
            catalog::handle_list_artist_releases(req, state)
                .await
                .context("Artist releases failed")
        })
        .get("/api/releases", |req, state| async move {
            catalog::handle_list_releases(req, state)
                .await
                .context("Release list failed")
        })
        .get("/api/releases/:id", |req, state| async move {
            catalog::handle_get_release(req, state)
                .await
                .context("Release get failed")
        })
        // ── Admin: gate-admitted ─────────────────────────────────────────────
        .post_admin("/api/artists", |req, state, claims| async move {
            catalog::handle_create_artist(req, state, claims)
                .await
                .context("Artist create failed")
        })
        .put_admin("/api/artists/:id", |req, state, claims| async move {
            catalog::handle_update_artist(req, state, claims)
                .await
                .context("Artist update failed")
        })
        .delete_admin("/api/artists/:id", |req, state, claims| async move {
            catalog::handle_delete_artist(req, state, claims)
                .await
                .context("Artist delete failed")
        })
        .post_admin("/api/releases", |req, state, claims| async move {
            catalog::handle_create_release(req, state, claims)
                .await
                .context("Release create failed")
        })
        .put_admin("/api/releases/:id", |req, state, claims| async move {
            catalog::handle_update_release(req, state, claims)
                .await
                .context("Release update failed")
        })
        .delete_admin("/api/releases/:id", |req, state, claims| async move {
            catalog::handle_delete_release(req, state, claims)
                .await
                .context("Release delete failed")
        })
        .post_admin("/api/streams", |req, state, claims| async move {
            admin::handle_record_streams(req, state, claims)
                .await
                .context("Stream ingest failed")
        })
        .get_admin("/api/analytics", |req, state, claims| async move {
            admin::handle_analytics(req, state, claims)
                .await
                .context("Analytics failed")
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
