//! Connection state and shared session record

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Connection lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Initial and terminal state
    Disconnected,
    /// Transport opening or awaiting handshake verification
    Connecting,
    /// Handshake verified; data and probes flow
    Connected,
    /// Close handshake in progress
    Disconnecting,
}

/// Session identifiers and info captured from the handshake
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Per-connection id assigned by the server; cleared on disconnect
    pub client_id: Option<String>,
    /// Session id; persists across disconnects and is replayed in the
    /// `X-Session-ID` cookie on the next connect
    pub session_id: String,
    /// Server-provided info document
    pub server_info: Option<Value>,
}

/// State shared between the facade and the connection worker.
///
/// The state mutex is the single authority for lifecycle transitions;
/// locks are short-lived and never held across an await.
pub(crate) struct Shared {
    state: Mutex<ConnectionState>,
    session: Mutex<Session>,
    last_ping_rtt_ms: AtomicU64,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(ConnectionState::Disconnected),
            session: Mutex::new(Session::default()),
            last_ping_rtt_ms: AtomicU64::new(0),
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *lock_unpoisoned(&self.state)
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, ConnectionState> {
        lock_unpoisoned(&self.state)
    }

    pub(crate) fn set_state(&self, next: ConnectionState) {
        *lock_unpoisoned(&self.state) = next;
    }

    pub(crate) fn session(&self) -> Session {
        lock_unpoisoned(&self.session).clone()
    }

    pub(crate) fn record_handshake(&self, client_id: String, session_id: String, info: Value) {
        let mut session = lock_unpoisoned(&self.session);
        session.client_id = Some(client_id);
        session.session_id = session_id;
        session.server_info = Some(info);
    }

    /// Clear the per-connection id; the session id survives for
    /// caller-driven reconnects
    pub(crate) fn clear_connection(&self) {
        lock_unpoisoned(&self.session).client_id = None;
    }

    pub(crate) fn last_ping_rtt_ms(&self) -> u64 {
        self.last_ping_rtt_ms.load(Ordering::Relaxed)
    }

    pub(crate) fn record_ping_rtt(&self, ms: u64) {
        self.last_ping_rtt_ms.store(ms, Ordering::Relaxed);
    }
}

/// Lock a mutex, recovering the data from a poisoned guard
fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
