//! Liveness probe.

/// Plain-text liveness check.
pub async fn health_check() -> &'static str {
    "OK"
}
