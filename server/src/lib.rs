//! HTTP backend for the soundfront site: public catalog API, static pages
//! and the gated admin area.

use std::convert::Infallible;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Request, StatusCode};
use shared::types::AppConfig;
use sqlx::SqlitePool;
use tower::util::BoxCloneService;
use tower::{Layer, service_fn};
use tracing::{debug, error, info};

pub mod auth;
pub mod database;
pub mod handlers;
pub mod tower_middle;

use auth::{AccessGate, AuthorizedAdmins, SessionVerifier, TokenIssuer};
use handlers::http::HttpResponse;
use handlers::http::routes::{Router, build_router};
use handlers::http::utils::fallback_error;
use tower_middle::{AdminGateLayer, TimeoutLayer};

/// Everything a handler needs, cheap to clone per request.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: SqlitePool,
    pub gate: Arc<AccessGate>,
    pub issuer: Arc<TokenIssuer>,
    /// `None` disables `/api/login`; the gate still honours existing tokens.
    pub admin_password_hash: Option<Arc<str>>,
}

impl AppState {
    /// Resolve secrets and identities (env first, then config) and build
    /// the gate and issuer from them.
    pub fn new(config: AppConfig, db: SqlitePool) -> Result<Self> {
        let secret = config
            .auth
            .resolved_jwt_secret()
            .ok_or_else(|| anyhow!("No JWT secret configured"))?;

        let admins = AuthorizedAdmins::new(config.auth.resolved_admin_usernames());
        if admins.is_empty() {
            return Err(anyhow!("No admin identity configured"));
        }
        info!("Admin identities configured: {}", admins.len());

        let verifier = SessionVerifier::new(&secret, Arc::new(admins));
        let gate = AccessGate::new(verifier, config.gate.clone());
        let issuer = TokenIssuer::new(&secret, config.auth.token_expiry_secs());

        let admin_password_hash: Option<Arc<str>> = config.auth.resolved_admin_password_hash().map(Arc::from);
        if admin_password_hash.is_none() {
            info!("No admin password hash configured; /api/login is disabled");
        }

        Ok(Self {
            config: Arc::new(config),
            db,
            gate: Arc::new(gate),
            issuer: Arc::new(issuer),
            admin_password_hash,
        })
    }
}

pub type AppService<B> = BoxCloneService<Request<B>, HttpResponse, Infallible>;

/// Assemble the full request pipeline:
/// timeout → admin gate → body collection → router.
pub fn build_service<B>(state: AppState) -> AppService<B>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let router = Arc::new(build_router(&state.config.gate, None));
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let gate = state.gate.clone();

    let app = service_fn(move |req: Request<B>| {
        let state = state.clone();
        let router = router.clone();
        async move { Ok::<_, Infallible>(dispatch(req, state, router).await) }
    });

    let gated = AdminGateLayer::new(gate).layer(app);
    let timed = TimeoutLayer::new(timeout).layer(gated);

    BoxCloneService::new(timed)
}

async fn dispatch<B>(req: Request<B>, state: AppState, router: Arc<Router>) -> HttpResponse
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!("{} {}", method, path);

    let (parts, body) = req.into_parts();
    let limit = state.config.server.max_body_bytes;

    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return fallback_error(
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                &format!("Request body exceeds {} bytes", limit),
            );
        }
        Err(e) => {
            debug!("Failed to read body for {} {}: {}", method, path, e);
            return fallback_error(
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                "Request body could not be read",
            );
        }
    };

    let result = router
        .route(Request::from_parts(parts, body), state)
        .await
        .with_context(|| format!("{} {}", method, path));

    match result {
        Ok(response) => response,
        Err(e) => {
            error!("Request failed: {:#}", e);
            fallback_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred",
            )
        }
    }
}
