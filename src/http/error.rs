//! Error normalization.
//!
//! # Responsibilities
//! - Define the single failure payload shape ever sent to a client
//! - Convert handler failures and chain interceptions (timeout, body
//!   limit, unmatched route) into that shape
//! - Refuse to write a second body once a response has started
//!
//! # Design Decisions
//! - Runs as an outer response-mapping layer so it sees every failure path
//! - A marker extension makes normalization idempotent (at most once)
//! - Unknown status codes resolve to the generic 500 descriptor

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::bus::BusError;
use crate::http::status::{self, HttpStatusCode};

/// The only failure payload shape ever emitted to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Stable machine-readable identifier from the status taxonomy.
    #[serde(rename = "type")]
    pub error_type: String,

    /// Human-readable summary.
    pub title: String,

    /// Optional request-specific detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    fn from_entry(entry: &status::StatusEntry, detail: Option<String>) -> Self {
        Self {
            error_type: entry.urn.to_string(),
            title: entry.message.to_string(),
            detail,
        }
    }
}

/// Response extension marking that the canonical error body has already
/// been written. Guarantees at-most-once normalization per request.
#[derive(Debug, Clone, Copy)]
pub struct Normalized;

/// Response extension set by a handler that has begun streaming its body.
/// Once present, a failure can no longer be converted to a canonical body;
/// the connection is closed instead.
#[derive(Debug, Clone, Copy)]
pub struct ResponseStarted;

/// A handler-level failure that resolves to a taxonomy status.
#[derive(Debug)]
pub struct ApiError {
    code: HttpStatusCode,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(code: HttpStatusCode) -> Self {
        Self { code, detail: None }
    }

    pub fn with_detail(code: HttpStatusCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: Some(detail.into()),
        }
    }

    pub fn code(&self) -> HttpStatusCode {
        self.code
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entry = self.code.entry();
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", entry.message, detail),
            None => write!(f, "{}", entry.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<BusError> for ApiError {
    fn from(err: BusError) -> Self {
        let code = match err {
            BusError::NoResponder(_) | BusError::Dropped(_) => {
                HttpStatusCode::ServiceUnavailable
            }
            BusError::ReplyTimeout(..) => HttpStatusCode::GatewayTimeout,
        };
        ApiError::with_detail(code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let entry = self.code.entry();
        let body = ErrorBody::from_entry(entry, self.detail);
        let mut response = (entry.status, Json(body)).into_response();
        response.extensions_mut().insert(Normalized);
        response
    }
}

/// Response-mapping middleware: rewrites any error-status response that is
/// not already canonical into the taxonomy's wire shape.
pub async fn normalize_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    normalize(response)
}

fn normalize(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }
    if response.extensions().get::<Normalized>().is_some() {
        return response;
    }
    if response.extensions().get::<ResponseStarted>().is_some() {
        // Headers are already on the wire; no replacement body can be
        // delivered. Close the connection instead of writing twice.
        tracing::error!(status = %status, "failure after response start, closing connection");
        let (mut parts, body) = response.into_parts();
        parts
            .headers
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
        return Response::from_parts(parts, body);
    }

    let entry = status::entry_for(status);
    let body = ErrorBody::from_entry(entry, None);
    let bytes = serde_json::to_vec(&body).unwrap_or_else(|_| {
        br#"{"type":"urn:dx:onb:internalServerError","title":"Internal Server Error"}"#.to_vec()
    });

    let (mut parts, _) = response.into_parts();
    parts.status = entry.status;
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::CONTENT_ENCODING);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.extensions.insert(Normalized);
    Response::from_parts(parts, Body::from(bytes))
}
