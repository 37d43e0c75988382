use axum::http::StatusCode;

/// `GET /healthz`: liveness only, no dependency checks.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Map a readiness probe result to the `GET /readyz` status.
///
/// Services run their own dependency check (database ping, ...) and pass the
/// outcome here so every service reports readiness the same way.
pub fn readiness<E: std::fmt::Display>(probe: Result<(), E>) -> StatusCode {
    match probe {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
