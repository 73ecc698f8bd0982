//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default listener port when TLS is enabled.
pub const DEFAULT_TLS_PORT: u16 = 8443;

/// Default listener port for plaintext HTTP.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Root configuration for the onboarding gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// API surface configuration (base path).
    pub api: ApiConfig,

    /// Listener configuration (port, TLS).
    pub listener: ListenerConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// CORS policy applied to every route.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// API surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base path prefix every route is registered under (e.g. "/dx/v1").
    pub dx_api_base_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            dx_api_base_path: "/dx/v1".to_string(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ListenerConfig {
    /// Serve TLS instead of plaintext HTTP.
    pub ssl: bool,

    /// Listen port. When absent, defaults per SSL mode (8443/8080).
    pub http_port: Option<u16>,

    /// TLS material, required when `ssl` is true.
    pub tls: Option<TlsConfig>,
}

impl ListenerConfig {
    /// Effective listen port: the configured port, or the per-mode default.
    pub fn listen_port(&self) -> u16 {
        self.http_port.unwrap_or(if self.ssl {
            DEFAULT_TLS_PORT
        } else {
            DEFAULT_HTTP_PORT
        })
    }
}

/// TLS configuration for the listener.
///
/// Certificate material is provisioned externally; the gateway only loads it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-request deadline in milliseconds. A request that has not started
    /// its response within this window is failed with 408.
    pub request_ms: u64,

    /// Bounded wait for a reply to a remote service proxy call, in
    /// milliseconds. Distinct from the request deadline: expiry maps to 504.
    pub proxy_reply_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_ms: 10_000,
            proxy_reply_ms: 5_000,
        }
    }
}

/// CORS policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Methods allowed on cross-origin requests.
    pub allowed_methods: Vec<String>,

    /// Headers allowed on cross-origin requests.
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "PATCH".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
                "HEAD".to_string(),
            ],
            allowed_headers: vec![
                "Accept".to_string(),
                "Authorization".to_string(),
                "Content-Length".to_string(),
                "Content-Type".to_string(),
                "Host".to_string(),
                "Origin".to_string(),
                "Referer".to_string(),
                "token".to_string(),
            ],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_follow_ssl_mode() {
        let mut listener = ListenerConfig::default();
        assert_eq!(listener.listen_port(), DEFAULT_HTTP_PORT);

        listener.ssl = true;
        assert_eq!(listener.listen_port(), DEFAULT_TLS_PORT);

        listener.http_port = Some(9443);
        assert_eq!(listener.listen_port(), 9443);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.api.dx_api_base_path, "/dx/v1");
        assert_eq!(config.timeouts.request_ms, 10_000);
        assert!(!config.listener.ssl);
        assert!(config.cors.allowed_methods.iter().any(|m| m == "OPTIONS"));
    }
}
