//! Client facade

use super::options::ClientOptions;
use super::state::{ConnectionState, Session, Shared};
use super::worker::{self, Command};
use crate::codec::{attachment_digest, Packet};
use crate::error::{ClientError, ConfigError, UsageError};
use crate::events::{ClientEvent, EventSender, EVENT_CHANNEL_CAPACITY};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// WebSocket protocol client.
///
/// Construction validates the options and hands back the event receiver —
/// the one listener for this connection. All lifecycle transitions and
/// packet arrivals are observable only through that channel; callbacks are
/// delivered on the worker task, so a UI consumer hops back to its own
/// context itself.
///
/// Cloning the client shares the same connection.
#[derive(Clone)]
pub struct WsClient {
    inner: Arc<Inner>,
}

struct Inner {
    options: ClientOptions,
    shared: Arc<Shared>,
    events: EventSender,
    commands: Mutex<Option<mpsc::UnboundedSender<Command>>>,
}

impl WsClient {
    /// Create a client and the event receiver for its connection.
    ///
    /// Fails when the options do not validate; no transport is opened
    /// until [`connect`](Self::connect).
    pub fn new(
        options: ClientOptions,
    ) -> Result<(Self, mpsc::Receiver<ClientEvent>), ConfigError> {
        options.validate()?;
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let client = Self {
            inner: Arc::new(Inner {
                options,
                shared: Arc::new(Shared::new()),
                events: EventSender::new(tx),
                commands: Mutex::new(None),
            }),
        };
        Ok((client, rx))
    }

    /// Start a connection attempt.
    ///
    /// Allowed only from the disconnected state; calling while already
    /// connecting or connected is rejected with
    /// [`UsageError::AlreadyConnected`] (also reported on the event
    /// channel) and leaves the live connection untouched. Must be called
    /// within a tokio runtime.
    pub fn connect(&self) -> Result<(), ClientError> {
        {
            let mut state = self.inner.shared.lock_state();
            if *state != ConnectionState::Disconnected {
                drop(state);
                return self.usage_error(UsageError::AlreadyConnected);
            }
            *state = ConnectionState::Connecting;
        }

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        *lock_commands(&self.inner.commands) = Some(cmd_tx);

        tracing::info!(url = %self.inner.options.url, "Connecting");
        tokio::spawn(worker::run(
            self.inner.options.clone(),
            Arc::clone(&self.inner.shared),
            self.inner.events.clone(),
            cmd_rx,
        ));
        Ok(())
    }

    /// Close the connection with the given code and reason.
    ///
    /// Idempotent: a no-op when already disconnected. Safe to call from
    /// within event handling; it only enqueues a command.
    pub fn disconnect(&self, code: u16, reason: &str) {
        if self.inner.shared.state() == ConnectionState::Disconnected {
            return;
        }
        tracing::debug!(code, reason, "Disconnect requested");
        if let Some(tx) = lock_commands(&self.inner.commands).as_ref() {
            let _ = tx.send(Command::Disconnect {
                code,
                reason: reason.to_string(),
            });
        }
    }

    /// Send a JSON document to the server.
    ///
    /// Valid only while connected; otherwise fails with
    /// [`UsageError::NotConnected`], reported on the event channel, and
    /// nothing is written.
    pub fn send(&self, document: Value) -> Result<(), ClientError> {
        self.dispatch(Packet::text(document))
    }

    /// Send a JSON descriptor with attachment bytes.
    ///
    /// When the descriptor is an object, a `file_hash` field carrying the
    /// hex SHA-256 of the attachment is inserted before framing.
    pub fn send_with_attachment(
        &self,
        mut document: Value,
        attachment: Vec<u8>,
    ) -> Result<(), ClientError> {
        if let Some(descriptor) = document.as_object_mut() {
            descriptor.insert(
                "file_hash".to_string(),
                Value::String(attachment_digest(&attachment)),
            );
        }
        self.dispatch(Packet::binary_attachment(document, attachment))
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.inner.shared.state()
    }

    /// True once the handshake has been verified
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Snapshot of the session identifiers and handshake info
    pub fn session(&self) -> Session {
        self.inner.shared.session()
    }

    /// Server-assigned per-connection id; absent outside a verified
    /// connection
    pub fn client_id(&self) -> Option<String> {
        self.inner.shared.session().client_id
    }

    /// Session id from the handshake; empty before the first successful
    /// handshake, persists afterwards
    pub fn session_id(&self) -> String {
        self.inner.shared.session().session_id
    }

    /// Server-provided info document from the handshake
    pub fn server_info(&self) -> Option<Value> {
        self.inner.shared.session().server_info
    }

    /// Latest measured round-trip time in milliseconds; 0 until a probe
    /// completes
    pub fn last_ping_rtt_ms(&self) -> u64 {
        self.inner.shared.last_ping_rtt_ms()
    }

    fn dispatch(&self, packet: Packet) -> Result<(), ClientError> {
        if self.inner.shared.state() != ConnectionState::Connected {
            return self.usage_error(UsageError::NotConnected);
        }
        let sent = match lock_commands(&self.inner.commands).as_ref() {
            Some(tx) => tx.send(Command::Send(packet)).is_ok(),
            None => false,
        };
        if sent {
            Ok(())
        } else {
            // Worker already went away; surface it as a usage error
            self.usage_error(UsageError::NotConnected)
        }
    }

    fn usage_error(&self, usage: UsageError) -> Result<(), ClientError> {
        let err = ClientError::from(usage);
        tracing::warn!(error = %err, "Rejected call");
        self.inner.events.emit_now(ClientEvent::Error(err.clone()));
        Err(err)
    }
}

fn lock_commands(
    commands: &Mutex<Option<mpsc::UnboundedSender<Command>>>,
) -> std::sync::MutexGuard<'_, Option<mpsc::UnboundedSender<Command>>> {
    commands
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_validates_options() {
        assert!(WsClient::new(ClientOptions::new("")).is_err());
        assert!(WsClient::new(ClientOptions::new("http://example.com")).is_err());
        assert!(WsClient::new(ClientOptions::new("ws://127.0.0.1:9000")).is_ok());
    }

    #[tokio::test]
    async fn test_send_while_disconnected_is_usage_error() {
        let (client, mut events) =
            WsClient::new(ClientOptions::new("ws://127.0.0.1:9000")).unwrap();

        let result = client.send(json!({"type": "help_request"}));
        assert!(matches!(
            result,
            Err(ClientError::Usage(UsageError::NotConnected))
        ));

        match events.recv().await {
            Some(ClientEvent::Error(ClientError::Usage(UsageError::NotConnected))) => {}
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_disconnect_when_disconnected_is_noop() {
        let (client, mut events) =
            WsClient::new(ClientOptions::new("ws://127.0.0.1:9000")).unwrap();

        client.disconnect(1000, "bye");
        client.disconnect(1000, "bye");

        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_accessors_before_handshake() {
        let (client, _events) =
            WsClient::new(ClientOptions::new("ws://127.0.0.1:9000")).unwrap();
        assert!(client.session_id().is_empty());
        assert!(client.client_id().is_none());
        assert!(client.server_info().is_none());
        assert_eq!(client.last_ping_rtt_ms(), 0);
    }
}
