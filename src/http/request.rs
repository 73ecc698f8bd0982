//! Request identification.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) as early as possible
//! - Propagate the ID onto the response for correlation
//!
//! # Design Decisions
//! - Incoming `x-request-id` values are trusted and kept; an ID is only
//!   generated when the header is absent

use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// [`MakeRequestId`] implementation producing UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}
