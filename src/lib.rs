//! Onboarding Gateway
//!
//! The HTTP edge layer of a data-onboarding service, built with Tokio and
//! Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────┐
//!                     │                GATEWAY                        │
//!                     │                                               │
//!  Client Request     │  ┌──────────┐   ┌─────────┐   ┌────────────┐  │
//!  ───────────────────┼─▶│ listener │──▶│ middle- │──▶│  router/   │  │
//!                     │  │ (TLS/TCP)│   │  ware   │   │  handlers  │  │
//!                     │  └──────────┘   │  chain  │   └─────┬──────┘  │
//!                     │                 └─────────┘         │         │
//!                     │                                     ▼         │
//!                     │                              ┌────────────┐   │
//!  Token Component    │                              │   token    │   │
//!  ◀──── service bus ─┼──────────────────────────────│   proxy    │   │
//!                     │                              └────────────┘   │
//!                     │                                               │
//!  Client Response    │  ┌──────────────────────────────────────────┐ │
//!  ◀──────────────────┼──│ error normalizer (canonical JSON shape)  │ │
//!                     │  └──────────────────────────────────────────┘ │
//!                     └───────────────────────────────────────────────┘
//! ```
//!
//! The middleware chain applies, in fixed order: CORS policy, common
//! security/cache headers, body size limiting, and a per-request deadline.
//! Any failure on any path resolves to one canonical JSON error shape via
//! the closed status taxonomy.

// Core subsystems
pub mod bus;
pub mod config;
pub mod http;
pub mod net;
pub mod token;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use bus::{Address, ServiceBus};
pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use token::TokenService;
