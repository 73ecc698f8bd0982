//! Service bus subsystem.
//!
//! # Data Flow
//! ```text
//! Caller                          Responder
//!   request(addr, payload) ──────▶ mpsc::Receiver<Envelope>
//!        │                              │ handle payload
//!        │◀──── oneshot reply ──────────┘
//!   await with bounded timeout
//! ```
//!
//! # Design Decisions
//! - Components are addressed by logical name, never by direct call
//! - Address table is immutable-after-init in practice; registration
//!   happens during startup only
//! - No responder means fail fast, never hang
//! - Reply wait is bounded and distinct from the HTTP request deadline

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};

/// Logical address of a component reachable over the bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request in flight to a responder, carrying its reply slot.
#[derive(Debug)]
pub struct Envelope {
    pub payload: serde_json::Value,
    pub reply: oneshot::Sender<serde_json::Value>,
}

/// Error type for bus operations.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("no responder registered at address '{0}'")]
    NoResponder(Address),

    #[error("no reply from '{0}' within {1:?}")]
    ReplyTimeout(Address, Duration),

    #[error("responder at '{0}' dropped the request")]
    Dropped(Address),
}

/// Process-wide registry of addressable responders.
///
/// Cheap to clone; all clones share one address table.
#[derive(Debug, Clone, Default)]
pub struct ServiceBus {
    responders: Arc<DashMap<Address, mpsc::Sender<Envelope>>>,
}

impl ServiceBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a responder at an address, returning its inbox.
    /// A previous registration at the same address is replaced.
    pub fn register(&self, address: Address, capacity: usize) -> mpsc::Receiver<Envelope> {
        let (tx, rx) = mpsc::channel(capacity);
        if self.responders.insert(address.clone(), tx).is_some() {
            tracing::warn!(address = %address, "replacing existing bus responder");
        }
        rx
    }

    /// Remove a responder registration.
    pub fn unregister(&self, address: &Address) {
        self.responders.remove(address);
    }

    /// Send a payload to the responder at `address` and await its reply,
    /// up to `reply_timeout`.
    ///
    /// Fails fast with [`BusError::NoResponder`] when the address has no
    /// live registration; never hangs past the bounded wait.
    pub async fn request(
        &self,
        address: &Address,
        payload: serde_json::Value,
        reply_timeout: Duration,
    ) -> Result<serde_json::Value, BusError> {
        let sender = self
            .responders
            .get(address)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BusError::NoResponder(address.clone()))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = Envelope {
            payload,
            reply: reply_tx,
        };

        if sender.send(envelope).await.is_err() {
            // Responder went away; drop the stale registration.
            self.responders
                .remove_if(address, |_, tx| tx.is_closed());
            return Err(BusError::NoResponder(address.clone()));
        }

        match tokio::time::timeout(reply_timeout, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(BusError::Dropped(address.clone())),
            Err(_) => Err(BusError::ReplyTimeout(address.clone(), reply_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn request_reply_round_trip() {
        let bus = ServiceBus::new();
        let address = Address::new("test.echo");
        let mut inbox = bus.register(address.clone(), 8);

        tokio::spawn(async move {
            while let Some(envelope) = inbox.recv().await {
                let _ = envelope.reply.send(json!({ "echo": envelope.payload }));
            }
        });

        let reply = bus
            .request(&address, json!({"hello": "world"}), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(reply["echo"]["hello"], "world");
    }

    #[tokio::test]
    async fn unregistered_address_fails_fast() {
        let bus = ServiceBus::new();
        let start = std::time::Instant::now();

        let err = bus
            .request(
                &Address::new("nobody.home"),
                json!({}),
                Duration::from_secs(30),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BusError::NoResponder(_)));
        // Fail fast: nowhere near the reply timeout.
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn silent_responder_times_out() {
        let bus = ServiceBus::new();
        let address = Address::new("test.silent");
        let mut inbox = bus.register(address.clone(), 1);

        tokio::spawn(async move {
            // Receive but never reply; keep the envelope alive so the
            // oneshot is not dropped early.
            let envelope = inbox.recv().await;
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(envelope);
        });

        let err = bus
            .request(&address, json!({}), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::ReplyTimeout(..)));
    }

    #[tokio::test]
    async fn dropped_responder_is_reported() {
        let bus = ServiceBus::new();
        let address = Address::new("test.dropper");
        let mut inbox = bus.register(address.clone(), 1);

        tokio::spawn(async move {
            // Drop the reply slot without answering.
            let _ = inbox.recv().await;
        });

        let err = bus
            .request(&address, json!({}), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::Dropped(_)));
    }

    #[tokio::test]
    async fn unregister_removes_responder() {
        let bus = ServiceBus::new();
        let address = Address::new("test.gone");
        let _inbox = bus.register(address.clone(), 1);
        bus.unregister(&address);

        let err = bus
            .request(&address, json!({}), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::NoResponder(_)));
    }
}
