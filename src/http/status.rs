//! Canonical status taxonomy.
//!
//! Every HTTP status the gateway can emit maps to exactly one descriptor
//! with a stable machine-readable URN and a default message. The set is
//! closed: it is enumerated here, checked complete at startup, and never
//! extended at runtime.

use axum::http::StatusCode;

/// Closed enumeration of every status the gateway can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpStatusCode {
    BadRequest,
    Unauthorized,
    NotFound,
    MethodNotAllowed,
    RequestTimeout,
    PayloadTooLarge,
    UnsupportedMediaType,
    TooManyRequests,
    InternalServerError,
    NotImplemented,
    ServiceUnavailable,
    GatewayTimeout,
}

/// One row of the taxonomy: status code, canonical type URN, default message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEntry {
    pub status: StatusCode,
    pub urn: &'static str,
    pub message: &'static str,
}

/// Fallback descriptor for a code outside the closed set. Unreachable given
/// the boot-time completeness check, kept for defense in depth.
pub const FALLBACK: StatusEntry = StatusEntry {
    status: StatusCode::INTERNAL_SERVER_ERROR,
    urn: "urn:dx:onb:internalServerError",
    message: "Internal Server Error",
};

static TABLE: &[StatusEntry] = &[
    StatusEntry {
        status: StatusCode::BAD_REQUEST,
        urn: "urn:dx:onb:badRequest",
        message: "Bad Request",
    },
    StatusEntry {
        status: StatusCode::UNAUTHORIZED,
        urn: "urn:dx:onb:invalidAuthorization",
        message: "Not Authorized",
    },
    StatusEntry {
        status: StatusCode::NOT_FOUND,
        urn: "urn:dx:onb:resourceNotFound",
        message: "Not Found",
    },
    StatusEntry {
        status: StatusCode::METHOD_NOT_ALLOWED,
        urn: "urn:dx:onb:methodNotAllowed",
        message: "Method Not Allowed",
    },
    StatusEntry {
        status: StatusCode::REQUEST_TIMEOUT,
        urn: "urn:dx:onb:requestTimeout",
        message: "Request Timed Out",
    },
    StatusEntry {
        status: StatusCode::PAYLOAD_TOO_LARGE,
        urn: "urn:dx:onb:payloadTooLarge",
        message: "Payload Too Large",
    },
    StatusEntry {
        status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
        urn: "urn:dx:onb:invalidContentType",
        message: "Unsupported Media Type",
    },
    StatusEntry {
        status: StatusCode::TOO_MANY_REQUESTS,
        urn: "urn:dx:onb:tooManyRequests",
        message: "Too Many Requests",
    },
    StatusEntry {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        urn: "urn:dx:onb:internalServerError",
        message: "Internal Server Error",
    },
    StatusEntry {
        status: StatusCode::NOT_IMPLEMENTED,
        urn: "urn:dx:onb:notImplemented",
        message: "Not Implemented",
    },
    StatusEntry {
        status: StatusCode::SERVICE_UNAVAILABLE,
        urn: "urn:dx:onb:serviceUnavailable",
        message: "Service Unavailable",
    },
    StatusEntry {
        status: StatusCode::GATEWAY_TIMEOUT,
        urn: "urn:dx:onb:gatewayTimeout",
        message: "Gateway Timeout",
    },
];

impl HttpStatusCode {
    /// Every variant, for the boot-time completeness check and tests.
    pub const ALL: &'static [HttpStatusCode] = &[
        HttpStatusCode::BadRequest,
        HttpStatusCode::Unauthorized,
        HttpStatusCode::NotFound,
        HttpStatusCode::MethodNotAllowed,
        HttpStatusCode::RequestTimeout,
        HttpStatusCode::PayloadTooLarge,
        HttpStatusCode::UnsupportedMediaType,
        HttpStatusCode::TooManyRequests,
        HttpStatusCode::InternalServerError,
        HttpStatusCode::NotImplemented,
        HttpStatusCode::ServiceUnavailable,
        HttpStatusCode::GatewayTimeout,
    ];

    /// The numeric status for this variant.
    pub const fn status(self) -> StatusCode {
        match self {
            HttpStatusCode::BadRequest => StatusCode::BAD_REQUEST,
            HttpStatusCode::Unauthorized => StatusCode::UNAUTHORIZED,
            HttpStatusCode::NotFound => StatusCode::NOT_FOUND,
            HttpStatusCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            HttpStatusCode::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            HttpStatusCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            HttpStatusCode::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            HttpStatusCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            HttpStatusCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            HttpStatusCode::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            HttpStatusCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            HttpStatusCode::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// The taxonomy row for this variant.
    pub fn entry(self) -> &'static StatusEntry {
        entry_for(self.status())
    }
}

/// Look up the descriptor for a status code, falling back to the generic
/// 500 entry when the code is outside the closed set.
pub fn entry_for(status: StatusCode) -> &'static StatusEntry {
    TABLE.iter().find(|e| e.status == status).unwrap_or(&FALLBACK)
}

/// Error from the boot-time taxonomy check.
#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    #[error("status {0} has no registered descriptor")]
    MissingEntry(StatusCode),

    #[error("status {0} has {1} registered descriptors, expected 1")]
    DuplicateEntry(StatusCode, usize),
}

/// Verify the taxonomy is complete: every enumerated status resolves to
/// exactly one descriptor whose numeric code round-trips. Called once at
/// server construction; failure is fatal to startup.
pub fn validate_taxonomy() -> Result<(), TaxonomyError> {
    for code in HttpStatusCode::ALL {
        let status = code.status();
        let matches = TABLE.iter().filter(|e| e.status == status).count();
        match matches {
            0 => return Err(TaxonomyError::MissingEntry(status)),
            1 => {}
            n => return Err(TaxonomyError::DuplicateEntry(status, n)),
        }
    }
    Ok(())
}
