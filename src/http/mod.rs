//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware chain)
//!     → request.rs (request ID)
//!     → handlers.rs (route handler slots, token proxy delegation)
//!     → error.rs (normalize any failure to the canonical shape)
//!     → status.rs (closed status taxonomy)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;
pub mod status;

pub use error::{ApiError, ErrorBody};
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
pub use status::HttpStatusCode;
