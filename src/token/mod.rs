//! Token service proxy.
//!
//! The token-issuing component is out of process and reachable only through
//! the service bus at a well-known address. This module holds the gateway's
//! client-side handle: created once at startup, shared read-only by every
//! request, never mutated afterwards.

use std::time::Duration;

use crate::bus::{Address, BusError, ServiceBus};

/// Well-known bus address of the token-issuing component.
pub const TOKEN_ADDRESS: &str = "onboarding.token.service";

/// Long-lived proxy handle for the token-issuing component.
///
/// Cheap to clone; all clones forward over the same bus.
#[derive(Debug, Clone)]
pub struct TokenService {
    bus: ServiceBus,
    address: Address,
    reply_timeout: Duration,
}

impl TokenService {
    /// Obtain the proxy handle bound to `address`.
    ///
    /// Registration of the remote responder is the remote component's
    /// concern; the handle is valid even while no responder exists, in
    /// which case calls fail fast.
    pub fn create_proxy(bus: &ServiceBus, address: Address, reply_timeout: Duration) -> Self {
        tracing::debug!(address = %address, "token service proxy created");
        Self {
            bus: bus.clone(),
            address,
            reply_timeout,
        }
    }

    /// Forward a caller-supplied token request payload to the remote
    /// component and await its reply within the bounded wait.
    pub async fn create_token(
        &self,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, BusError> {
        self.bus
            .request(&self.address, payload, self.reply_timeout)
            .await
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}
