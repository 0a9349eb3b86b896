//! Typed event delivery
//!
//! Lifecycle and data events are fanned out to the one consumer per
//! connection over a bounded channel, in generation order.

use crate::codec::Packet;
use crate::error::ClientError;
use serde_json::Value;
use tokio::sync::mpsc;

/// Capacity of the event channel handed to the consumer
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Events observable on a connection
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A connection attempt has started
    Connecting,
    /// The session handshake completed
    Connected {
        /// Server-assigned session identifier
        session_id: String,
        /// Server-provided info document from the handshake
        server_info: Value,
    },
    /// The connection ended; emitted exactly once per attempt
    Disconnected {
        /// Close code
        code: u16,
        /// Close reason, described when the peer supplied none
        reason: String,
    },
    /// A protocol packet arrived, in transport order
    PacketReceived(Packet),
    /// An error was observed; decode and usage errors leave the
    /// connection state untouched
    Error(ClientError),
    /// A round-trip probe completed, in milliseconds
    PingTime(u64),
}

/// Sending half of the event channel, used by the connection worker
#[derive(Clone)]
pub(crate) struct EventSender {
    tx: mpsc::Sender<ClientEvent>,
}

impl EventSender {
    pub(crate) fn new(tx: mpsc::Sender<ClientEvent>) -> Self {
        Self { tx }
    }

    /// Deliver an event to the consumer.
    ///
    /// Returns false when the consumer dropped the receiver; the worker
    /// treats that as a shutdown signal.
    pub(crate) async fn emit(&self, event: ClientEvent) -> bool {
        if self.tx.send(event).await.is_err() {
            tracing::debug!("Event receiver dropped");
            return false;
        }
        true
    }

    /// Best-effort delivery from synchronous facade methods; never blocks
    /// the caller.
    pub(crate) fn emit_now(&self, event: ClientEvent) {
        if let Err(e) = self.tx.try_send(event) {
            tracing::debug!(error = %e, "Dropping event, channel unavailable");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_events_delivered_in_order() {
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let sender = EventSender::new(tx);

        assert!(sender.emit(ClientEvent::Connecting).await);
        assert!(
            sender
                .emit(ClientEvent::Connected {
                    session_id: "abc123".to_string(),
                    server_info: json!({"version": 1}),
                })
                .await
        );

        assert!(matches!(rx.recv().await, Some(ClientEvent::Connecting)));
        match rx.recv().await {
            Some(ClientEvent::Connected { session_id, .. }) => {
                assert_eq!(session_id, "abc123")
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_emit_reports_dropped_receiver() {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let sender = EventSender::new(tx);
        drop(rx);

        assert!(!sender.emit(ClientEvent::Connecting).await);
    }
}
