//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check TLS material is present when SSL is enabled
//! - Check CORS method/header names parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::{HeaderName, Method};

use crate::config::schema::GatewayConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("api.dx_api_base_path must start with '/' and not be bare '/': {0:?}")]
    InvalidBasePath(String),

    #[error("limits.max_body_bytes must be greater than 0")]
    ZeroBodyLimit,

    #[error("timeouts.{0} must be greater than 0")]
    ZeroTimeout(&'static str),

    #[error("listener.ssl is enabled but listener.tls is not configured")]
    MissingTlsMaterial,

    #[error("cors.allowed_methods entry is not a valid HTTP method: {0:?}")]
    InvalidCorsMethod(String),

    #[error("cors.allowed_headers entry is not a valid header name: {0:?}")]
    InvalidCorsHeader(String),

    #[error("cors.allowed_methods must not be empty")]
    EmptyCorsMethods,
}

/// Validate a configuration, collecting every error before rejecting.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let base = &config.api.dx_api_base_path;
    if !base.starts_with('/') || base.len() < 2 || base.ends_with('/') {
        errors.push(ValidationError::InvalidBasePath(base.clone()));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.timeouts.request_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("request_ms"));
    }
    if config.timeouts.proxy_reply_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("proxy_reply_ms"));
    }

    if config.listener.ssl && config.listener.tls.is_none() {
        errors.push(ValidationError::MissingTlsMaterial);
    }

    if config.cors.allowed_methods.is_empty() {
        errors.push(ValidationError::EmptyCorsMethods);
    }
    for method in &config.cors.allowed_methods {
        if method.parse::<Method>().is_err() {
            errors.push(ValidationError::InvalidCorsMethod(method.clone()));
        }
    }
    for header in &config.cors.allowed_headers {
        if header.parse::<HeaderName>().is_err() {
            errors.push(ValidationError::InvalidCorsHeader(header.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
