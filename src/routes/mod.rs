use axum::http::StatusCode;

pub mod dashboard;
pub mod health;

// Common error mappers
pub fn internal_error<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, format!("internal error: {e}"))
}

/// No view has been published yet.
pub fn not_ready(last_error: Option<&str>) -> (StatusCode, String) {
    let msg = match last_error {
        Some(e) => format!("dashboard not ready: {e}"),
        None => "dashboard not ready: first refresh still running".to_string(),
    };
    (StatusCode::SERVICE_UNAVAILABLE, msg)
}
