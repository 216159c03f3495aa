//! HTTP server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::gate::AdmissionLayer;
use super::handler::demo_handler;
use crate::error::Result;
use crate::ratelimit::AdmissionControl;

/// HTTP server with every route behind the admission gate.
pub struct HttpServer<A: AdmissionControl + 'static> {
    /// Bound listener
    listener: TcpListener,
    /// Admission decision source
    admission: Arc<A>,
}

impl<A: AdmissionControl + 'static> HttpServer<A> {
    /// Bind the listening socket.
    ///
    /// Binding happens before serving so callers can learn the local
    /// address (e.g. when binding port 0) and start sending traffic.
    pub async fn bind(addr: SocketAddr, admission: Arc<A>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            admission,
        })
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Build the application router.
    pub fn router(admission: Arc<A>) -> Router {
        Router::new()
            .route("/", get(demo_handler))
            .layer(AdmissionLayer::new(admission))
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        let app = Self::router(self.admission);

        info!(addr = %addr, "Starting HTTP server with graceful shutdown");

        axum::serve(self.listener, app)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP server failed");
                e.into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::RateLimiter;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_router_limits_root() {
        let limiter = Arc::new(RateLimiter::new(2));
        let app = HttpServer::router(limiter);

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap();
            statuses.push(response.status());
        }

        assert_eq!(
            statuses,
            vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
        );
    }

    #[tokio::test]
    async fn test_serve_over_tcp() {
        let limiter = Arc::new(RateLimiter::new(1));
        let server = HttpServer::bind("127.0.0.1:0".parse().unwrap(), limiter)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_with_shutdown(async {
            let _ = rx.await;
        }));

        let client = reqwest::Client::new();
        let url = format!("http://{}/", addr);

        let first = client.get(&url).send().await.unwrap();
        assert_eq!(first.status().as_u16(), 200);

        let second = client.get(&url).send().await.unwrap();
        assert_eq!(second.status().as_u16(), 429);
        assert_eq!(second.text().await.unwrap(), "Too Many Requests");

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
