//! ws-link: typed packet-protocol client over WebSocket
//!
//! This library provides the core components for:
//! - Connection lifecycle management with an explicit state machine
//! - A two-shape packet protocol multiplexing JSON control messages and
//!   binary attachments over one socket
//! - Session handshake verification (session id + server info)
//! - Round-trip latency probing over the live connection
//! - Typed event delivery over a channel, decoupled from socket I/O
//! - Server-driven dialog routing convention
//! - Structured logging and telemetry helpers

pub mod client;
pub mod codec;
pub mod dialog;
pub mod error;
pub mod events;
pub mod telemetry;
