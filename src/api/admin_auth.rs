use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

pub const ADMIN_KEY_HEADER: &str = "X-Internal-Api-Key";

/// Compares without short-circuiting on the first differing byte
fn keys_match(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    provided
        .iter()
        .zip(expected)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// Reject settings changes that do not carry the internal API key
pub async fn require_internal_api_key(
    State(expected): State<String>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .map(|h| h.as_bytes())
        .unwrap_or_default();

    if expected.is_empty() || !keys_match(provided, expected.as_bytes()) {
        warn!("Rejected admin request to {}", request.uri().path());
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }

    next.run(request).await
}
