//! WebSocket protocol client
//!
//! Connection lifecycle state machine, validated options, the client
//! facade, and the worker task that owns the socket and the round-trip
//! probe scheduler.

mod handle;
mod options;
mod state;
mod worker;

pub use handle::WsClient;
pub use options::ClientOptions;
pub use state::{ConnectionState, Session};
