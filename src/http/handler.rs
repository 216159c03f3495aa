//! Demo downstream handler served behind the admission gate.

use axum::http::StatusCode;
use tracing::info;

/// Accept the request and report completion.
pub async fn demo_handler() -> StatusCode {
    info!("Request completed");
    StatusCode::OK
}
