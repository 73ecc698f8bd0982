//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; request ID flows through all spans
//! - No metrics endpoint: observability layers beyond logging are out of
//!   scope for this edge component

pub mod logging;
