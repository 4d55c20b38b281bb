//! Request identification.
//!
//! # Responsibilities
//! - Assign a request ID (UUID v4) to requests that arrive without one
//! - Echo the ID on the response
//! - Expose the ID to handlers for logging and upstream propagation
//!
//! # Design Decisions
//! - Request ID added as early as possible (outermost layer) for tracing
//! - A caller-provided `x-request-id` is kept as is

use axum::http::HeaderMap;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer that fills in a missing `x-request-id`.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer that copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// The request ID carried by `headers`, or a fresh one if absent or unreadable.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_existing_id_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");
    }

    #[test]
    fn test_missing_id_is_generated() {
        let id = request_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
