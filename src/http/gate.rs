//! Admission gate middleware.
//!
//! [`AdmissionLayer`] wraps any downstream service. Each request first asks
//! the [`AdmissionControl`] source for a decision; admitted requests reach
//! the inner service untouched, rejected ones are answered with
//! `429 Too Many Requests` without the inner service ever seeing them.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::info;

use crate::ratelimit::AdmissionControl;

/// Layer that puts an [`AdmissionGate`] in front of a service.
pub struct AdmissionLayer<A: ?Sized> {
    admission: Arc<A>,
}

impl<A: AdmissionControl + ?Sized> AdmissionLayer<A> {
    pub fn new(admission: Arc<A>) -> Self {
        Self { admission }
    }
}

impl<A: ?Sized> Clone for AdmissionLayer<A> {
    fn clone(&self) -> Self {
        Self {
            admission: Arc::clone(&self.admission),
        }
    }
}

impl<S, A: ?Sized> Layer<S> for AdmissionLayer<A> {
    type Service = AdmissionGate<S, A>;

    fn layer(&self, inner: S) -> Self::Service {
        AdmissionGate {
            inner,
            admission: Arc::clone(&self.admission),
        }
    }
}

/// Service that forwards admitted requests and rejects the rest.
pub struct AdmissionGate<S, A: ?Sized> {
    /// Downstream handler
    inner: S,
    /// Decision source shared by every clone of the gate
    admission: Arc<A>,
}

impl<S: Clone, A: ?Sized> Clone for AdmissionGate<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            admission: Arc::clone(&self.admission),
        }
    }
}

impl<S, A> Service<Request<Body>> for AdmissionGate<S, A>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Send + 'static,
    S::Future: Send + 'static,
    A: AdmissionControl + ?Sized + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        if !self.admission.admit() {
            info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request not processed: rate limit exceeded"
            );
            return Box::pin(async { Ok(too_many_requests()) });
        }

        Box::pin(self.inner.call(request))
    }
}

/// The rejection response: status 429 with its canonical reason as body.
pub fn too_many_requests() -> Response {
    let status = StatusCode::TOO_MANY_REQUESTS;
    let reason = status.canonical_reason().unwrap_or("Too Many Requests");
    (status, reason).into_response()
}
