//! Request ID middleware for request tracing and correlation.
//!
//! Uses the upstream `x-request-id` if present, otherwise generates one. The ID
//! is recorded on the current span, tagged in Sentry, and echoed back in the
//! response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::Span;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const GENERATED_ID_LENGTH: usize = 16;

fn generate_request_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty())
        .map_or_else(generate_request_id, String::from);

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_distinct_and_header_safe() {
        let a = generate_request_id();
        let b = generate_request_id();
        assert_eq!(a.len(), GENERATED_ID_LENGTH);
        assert_ne!(a, b);
        assert!(HeaderValue::from_str(&a).is_ok());
    }
}
