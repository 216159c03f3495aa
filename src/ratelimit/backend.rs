//! Admission trait for abstracting the limiter behind the HTTP gate.

/// Trait for admission decision sources.
///
/// The HTTP gate only needs a yes/no answer per request, so it is generic
/// over this trait rather than tied to [`RateLimiter`](super::RateLimiter).
pub trait AdmissionControl: Send + Sync {
    /// Decide whether the current request may proceed.
    fn admit(&self) -> bool;
}
