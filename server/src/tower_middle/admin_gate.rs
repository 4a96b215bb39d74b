use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use hyper::Request;
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::auth::{AccessGate, GateDecision};
use crate::handlers::http::HttpResponse;
use crate::handlers::http::utils::redirect_response;

/// Tower layer for the admin area
///
/// Wraps the application service and runs the access gate before any
/// handler sees a request under the protected prefix.
#[derive(Clone)]
pub struct AdminGateLayer {
    gate: Arc<AccessGate>,
}

impl AdminGateLayer {
    pub fn new(gate: Arc<AccessGate>) -> Self {
        Self { gate }
    }
}

impl<S> Layer<S> for AdminGateLayer {
    type Service = AdminGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdminGateService {
            inner,
            gate: self.gate.clone(),
        }
    }
}

/// The service that applies the gate decision
#[derive(Clone)]
pub struct AdminGateService<S> {
    inner: S,
    gate: Arc<AccessGate>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for AdminGateService<S>
where
    S: Service<Request<ReqBody>, Response = HttpResponse> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let decision = self.gate.decide_request(&req);

        match decision {
            GateDecision::Admit(claims) => {
                if let Some(claims) = claims {
                    debug!(
                        "Admin gate admitted {} for {}",
                        req.uri().path(),
                        claims.username().unwrap_or("<no username>")
                    );
                    req.extensions_mut().insert(claims);
                }

                // The clone may not be ready; swap so the ready one handles
                // this request.
                let clone = self.inner.clone();
                let mut inner = std::mem::replace(&mut self.inner, clone);
                Box::pin(async move { inner.call(req).await })
            }
            denied => {
                let location = self.gate.redirect_target(&denied).unwrap_or("/");
                if let GateDecision::RedirectToLogin(reason)
                | GateDecision::RedirectToUnauthorized(reason) = &denied
                {
                    warn!(
                        "Admin gate denied {}: {} (redirect to {})",
                        req.uri().path(),
                        reason,
                        location
                    );
                }
                let response = redirect_response(location);
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthorizedAdmins, SessionVerifier, TokenIssuer};
    use crate::handlers::http::utils::empty;
    use hyper::StatusCode;
    use shared::types::{GateConfig, SessionClaims};
    use std::convert::Infallible;
    use tower::ServiceExt;

    const SECRET: &str = "layer-secret-layer-secret-layer-secret";

    fn layer() -> AdminGateLayer {
        let verifier =
            SessionVerifier::new(SECRET, Arc::new(AuthorizedAdmins::single("shakibkumnale")));
        AdminGateLayer::new(Arc::new(AccessGate::new(verifier, GateConfig::default())))
    }

    // Inner service answers 200 and echoes whether claims were attached.
    async fn echo(req: Request<()>) -> Result<HttpResponse, Infallible> {
        let mut res = HttpResponse::new(empty());
        if req.extensions().get::<SessionClaims>().is_some() {
            res.headers_mut()
                .insert("x-claims", hyper::header::HeaderValue::from_static("1"));
        }
        Ok(res)
    }

    #[tokio::test]
    async fn public_path_passes_through() {
        let svc = layer().layer(tower::service_fn(echo));
        let req = Request::builder().uri("/api/artists").body(()).unwrap();
        let res = svc.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().get("x-claims").is_none());
    }

    #[tokio::test]
    async fn protected_path_without_cookie_redirects() {
        let svc = layer().layer(tower::service_fn(echo));
        let req = Request::builder().uri("/admin/artists").body(()).unwrap();
        let res = svc.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()["location"], "/login");
    }

    #[tokio::test]
    async fn admitted_request_carries_claims() {
        let token = TokenIssuer::new(SECRET, 3600)
            .issue_admin("shakibkumnale")
            .unwrap()
            .0;
        let svc = layer().layer(tower::service_fn(echo));
        let req = Request::builder()
            .uri("/admin")
            .header("cookie", format!("token={}", token))
            .body(())
            .unwrap();
        let res = svc.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["x-claims"], "1");
    }
}
