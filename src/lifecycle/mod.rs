//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Taxonomy check → Proxy handle → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, the process never claims to
//!   be serving after a bind or certificate failure

pub mod shutdown;

pub use shutdown::Shutdown;
