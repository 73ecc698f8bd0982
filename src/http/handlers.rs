//! Business handler slots.
//!
//! Each route produces exactly one terminal action: a success body, an
//! [`ApiError`] handed to the normalizer, or a delegation to the token
//! service proxy. Onboarding and ingestion are handler slots whose business
//! logic lives elsewhere; until it lands they answer 501 rather than
//! leaving the response open.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::config::GatewayConfig;
use crate::http::error::ApiError;
use crate::http::status::HttpStatusCode;
use crate::token::TokenService;

/// Shared read-only state injected into handlers at router build.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub tokens: TokenService,
}

/// Reject bodies whose declared content type is not JSON.
fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    match headers.get(header::CONTENT_TYPE) {
        None => Ok(()),
        Some(value) => {
            let is_json = value
                .to_str()
                .map(|v| v.trim_start().starts_with("application/json"))
                .unwrap_or(false);
            if is_json {
                Ok(())
            } else {
                Err(ApiError::with_detail(
                    HttpStatusCode::UnsupportedMediaType,
                    "expected application/json",
                ))
            }
        }
    }
}

fn parse_body(body: &Bytes) -> Result<serde_json::Value, ApiError> {
    serde_json::from_slice(body).map_err(|err| {
        ApiError::with_detail(HttpStatusCode::BadRequest, format!("invalid JSON body: {err}"))
    })
}

/// POST `<base>/token` — forwards the payload to the token-issuing
/// component over the service bus and relays its reply.
pub async fn handle_token_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(err) = require_json(&headers) {
        return err.into_response();
    }
    let payload = match parse_body(&body) {
        Ok(payload) => payload,
        Err(err) => return err.into_response(),
    };

    tracing::debug!(address = %state.tokens.address(), "forwarding token request");
    match state.tokens.create_token(payload).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "token service call failed");
            ApiError::from(err).into_response()
        }
    }
}

/// POST `<base>/onboarding` — handler slot, business logic not yet landed.
pub async fn handle_onboarding_query(headers: HeaderMap, body: Bytes) -> Response {
    if let Err(err) = require_json(&headers) {
        return err.into_response();
    }
    if let Err(err) = parse_body(&body) {
        return err.into_response();
    }
    ApiError::new(HttpStatusCode::NotImplemented).into_response()
}

/// POST `<base>/ingestion` — handler slot, business logic not yet landed.
pub async fn handle_ingestion_query(headers: HeaderMap, body: Bytes) -> Response {
    if let Err(err) = require_json(&headers) {
        return err.into_response();
    }
    if let Err(err) = parse_body(&body) {
        return err.into_response();
    }
    ApiError::new(HttpStatusCode::NotImplemented).into_response()
}

/// Fallback for unmatched method+path pairs.
pub async fn fallback() -> ApiError {
    ApiError::new(HttpStatusCode::NotFound)
}
