//! Self-test traffic generator.
//!
//! Sends a fixed number of sequential GET requests at a steady pace and
//! tallies how many the server admitted and how many it rejected.

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::config::LoadTestConfig;
use crate::error::Result;

/// Outcome counts of a load run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Responses with status 200
    pub admitted: usize,
    /// Responses with status 429
    pub rejected: usize,
    /// Any other status
    pub unexpected: usize,
}

impl LoadReport {
    pub fn total(&self) -> usize {
        self.admitted + self.rejected + self.unexpected
    }

    fn record(&mut self, status: StatusCode) {
        match status {
            StatusCode::OK => self.admitted += 1,
            StatusCode::TOO_MANY_REQUESTS => self.rejected += 1,
            other => {
                warn!(status = %other, "Unexpected response status");
                self.unexpected += 1;
            }
        }
    }
}

/// Drives traffic at a single URL.
pub struct LoadGenerator {
    client: reqwest::Client,
    url: String,
    requests: usize,
    interval_ms: u64,
}

impl LoadGenerator {
    /// Create a generator aimed at `path` on the server at `addr`.
    pub fn new(addr: SocketAddr, config: &LoadTestConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("http://{}{}", addr, config.path),
            requests: config.requests,
            interval_ms: config.interval_ms,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send all requests, pausing `interval_ms` before each one.
    ///
    /// A transport failure aborts the run.
    pub async fn run(&self) -> Result<LoadReport> {
        info!(
            url = %self.url,
            requests = self.requests,
            interval_ms = self.interval_ms,
            "Starting self-test traffic"
        );

        let interval = Duration::from_millis(self.interval_ms);
        let mut report = LoadReport::default();
        for i in 0..self.requests {
            tokio::time::sleep(interval).await;
            let response = self.client.get(&self.url).send().await?;
            debug!(request = i, status = %response.status(), "Self-test response");
            report.record(response.status());
        }

        info!(
            admitted = report.admitted,
            rejected = report.rejected,
            unexpected = report.unexpected,
            "Self-test traffic finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TurnstileError;
    use crate::http::HttpServer;
    use crate::ratelimit::RateLimiter;
    use std::sync::Arc;

    #[test]
    fn test_report_tallies_statuses() {
        let mut report = LoadReport::default();
        report.record(StatusCode::OK);
        report.record(StatusCode::OK);
        report.record(StatusCode::TOO_MANY_REQUESTS);
        report.record(StatusCode::NOT_FOUND);

        assert_eq!(
            report,
            LoadReport {
                admitted: 2,
                rejected: 1,
                unexpected: 1,
            }
        );
        assert_eq!(report.total(), 4);
    }

    #[test]
    fn test_generator_from_config() {
        let config = LoadTestConfig {
            path: "/ping".to_string(),
            interval_ms: 25,
            ..LoadTestConfig::default()
        };
        let generator = LoadGenerator::new("127.0.0.1:9000".parse().unwrap(), &config);
        assert_eq!(generator.url(), "http://127.0.0.1:9000/ping");
        assert_eq!(generator.interval_ms, 25);
        assert_eq!(generator.requests, 1000);
    }

    #[tokio::test]
    async fn test_run_against_local_server() {
        let limiter = Arc::new(RateLimiter::new(5));
        let server = HttpServer::bind("127.0.0.1:0".parse().unwrap(), limiter)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_with_shutdown(async {
            let _ = rx.await;
        }));

        let config = LoadTestConfig {
            enabled: true,
            requests: 8,
            interval_ms: 0,
            ..LoadTestConfig::default()
        };
        let report = LoadGenerator::new(addr, &config).run().await.unwrap();

        assert_eq!(report.total(), 8);
        assert_eq!(report.unexpected, 0);
        // Eight back-to-back requests fit in one second on any sane host.
        assert_eq!(report.admitted, 5);
        assert_eq!(report.rejected, 3);

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_connection_failure_aborts() {
        // Bind then drop to get a port with nothing listening.
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let config = LoadTestConfig {
            requests: 1,
            interval_ms: 0,
            ..LoadTestConfig::default()
        };
        let err = LoadGenerator::new(addr, &config).run().await.unwrap_err();
        assert!(matches!(err, TurnstileError::Http(_)));
    }
}
