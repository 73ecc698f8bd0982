//! Network layer subsystem.
//!
//! # Design Decisions
//! - Listener binding happens last in startup; traffic only when ready
//! - TLS is optional and selected by config, with externally provisioned
//!   certificate material

pub mod tls;
