//! HTTP middleware translating limiter decisions into 429 responses.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::{Response, StatusCode},
    response::IntoResponse,
    Json,
};
use tower::{Layer, Service};
use tracing::warn;

use crate::http::client_key::client_key;
use crate::ratelimit::{Decision, RateLimiter};

/// A [`tower::Layer`] that gates requests behind the per-client limiter.
///
/// Requests whose path is in the bypass set, or every request when the
/// layer is disabled, reach the inner service without touching the limiter.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<RateLimiter>,
    enabled: bool,
    bypass_paths: Arc<HashSet<String>>,
}

impl RateLimitLayer {
    /// Create a layer over a shared limiter.
    pub fn new(limiter: Arc<RateLimiter>, enabled: bool, bypass_paths: HashSet<String>) -> Self {
        Self {
            limiter,
            enabled,
            bypass_paths: Arc::new(bypass_paths),
        }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            limiter: self.limiter.clone(),
            enabled: self.enabled,
            bypass_paths: self.bypass_paths.clone(),
        }
    }
}

/// The middleware service produced by [`RateLimitLayer`].
#[derive(Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    limiter: Arc<RateLimiter>,
    enabled: bool,
    bypass_paths: Arc<HashSet<String>>,
}

impl<S> Service<Request<Body>> for RateLimitMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let enabled = self.enabled;
        let bypass_paths = self.bypass_paths.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !enabled || bypass_paths.contains(req.uri().path()) {
                return inner.call(req).await;
            }

            // Prefer proxy headers, then fall back to the transport peer
            // address when the server was started with connect info.
            let peer = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr);
            let key = client_key(req.headers(), peer);

            match limiter.admit(&key) {
                Decision::Admitted => inner.call(req).await,
                Decision::Rejected { retry_after_secs } => {
                    warn!(
                        client = %key,
                        path = %req.uri().path(),
                        retry_after_secs,
                        "Rate limit exceeded"
                    );
                    Ok(too_many_requests(retry_after_secs))
                }
            }
        })
    }
}

/// Build the structured 429 response for a rejected request.
fn too_many_requests(retry_after_secs: u64) -> Response<Body> {
    (
        StatusCode::TOO_MANY_REQUESTS,
        [("Retry-After", retry_after_secs.to_string())],
        Json(serde_json::json!({
            "error": "too_many_requests",
            "message": "Request limit exceeded. Wait before retrying.",
            "retry_after": retry_after_secs,
        })),
    )
        .into_response()
}
